//! Timestamp parsing and rendering.
//!
//! The same lenient parser is used for bot log lines, cached transcriptions and
//! event boundaries from configuration. Timestamps without an offset are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M %z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp in any of the formats the bot log, the cache or a config file use.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.,fff]` with an optional `+HHMM`,
/// `+HH:MM`, `Z` or `UTC` suffix, `YYYY-MM-DD HH:MM` and a bare date.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = normalize(raw);

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00`.
///
/// The fractional part is only written when it is non-zero.
#[must_use]
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    if time.timestamp_subsec_micros() == 0 {
        time.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    } else {
        time.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
    }
}

fn normalize(raw: &str) -> String {
    let mut value = raw.replace(',', ".");

    // A `T` date/time separator is treated like a space.
    if value.len() > 10 && value.as_bytes()[10] == b'T' {
        value.replace_range(10..11, " ");
    }

    for suffix in [" UTC", "UTC", "Z"] {
        if let Some(stripped) = value.strip_suffix(suffix) {
            return format!("{}+00:00", stripped.trim_end());
        }
    }

    value
}

/// Serde adapter storing timestamps in the [`format_timestamp`] form.
pub mod serde_format {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize a timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(time))
    }

    /// Deserialize a timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a string or not a recognised timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}
