//! Done records extracted from the moderation bot log.
//!
//! A done line is a positional, space-separated record:
//!
//! ```text
//! 2021-04-01 12:34:56,789 UTC - INFO - tor.core.commands - process_done - t3_abc123 done by someuser ...
//! ^------ timestamp ------^                                               ^[10]           ^[13]
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::constants::{DONE_MARKER, MODERATOR_OVERRIDE_MARKER};
use crate::timestamp::{self, parse_timestamp};

const MIN_TOKENS: usize = 14;
const TIMESTAMP_TOKENS: usize = 3;
const POST_ID_TOKEN: usize = 10;
const USERNAME_TOKEN: usize = 13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedLogLineError {
    #[error("log line has {found} tokens, expected at least 14")]
    TooFewTokens { found: usize },
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// A transcription marked as done by a volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoneRecord {
    #[serde(rename = "timestamp", with = "timestamp::serde_format")]
    pub time: DateTime<Utc>,
    pub post_id: String,
    pub username: String,
}

impl DoneRecord {
    /// Parse a single done line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line has fewer than 14 tokens or its first three
    /// tokens do not form a timestamp.
    pub fn parse(line: &str) -> Result<Self, MalformedLogLineError> {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() < MIN_TOKENS {
            return Err(MalformedLogLineError::TooFewTokens {
                found: tokens.len(),
            });
        }

        let raw_timestamp = tokens[..TIMESTAMP_TOKENS].join(" ");
        let time = parse_timestamp(&raw_timestamp)
            .ok_or(MalformedLogLineError::InvalidTimestamp(raw_timestamp))?;

        Ok(Self {
            time,
            post_id: tokens[POST_ID_TOKEN].to_string(),
            username: tokens[USERNAME_TOKEN].to_string(),
        })
    }
}

/// Keep only the lines that record a real completion.
#[must_use]
pub fn select_done_lines<'a, I>(lines: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| line.contains(DONE_MARKER) && !line.contains(MODERATOR_OVERRIDE_MARKER))
        .collect()
}

/// Parse selected done lines, skipping the ones that are malformed.
#[must_use]
pub fn parse_done_lines(lines: &[&str]) -> Vec<DoneRecord> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| match DoneRecord::parse(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(line = index + 1, "Skipping malformed done line: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LINE: &str = "2021-04-01 12:34:56,789 UTC - INFO - tor.core.commands - process_done - t3_abc123 done by someuser";

    #[test]
    fn test_parse_extracts_fields() {
        let record = DoneRecord::parse(LINE).unwrap();

        assert_eq!(record.post_id, "t3_abc123");
        assert_eq!(record.username, "someuser");
        assert_eq!(
            record.time.timestamp(),
            Utc.with_ymd_and_hms(2021, 4, 1, 12, 34, 56).unwrap().timestamp()
        );
    }

    #[test]
    fn test_parse_ignores_trailing_tokens() {
        let base = DoneRecord::parse(LINE).unwrap();
        let longer = DoneRecord::parse(&format!("{LINE} (via u/ToR_bot) extra tokens here")).unwrap();

        assert_eq!(base.post_id, longer.post_id);
        assert_eq!(base.username, longer.username);
        assert_eq!(base.time, longer.time);
    }

    #[test]
    fn test_parse_too_few_tokens() {
        let err = DoneRecord::parse("2021-04-01 12:34:56,789 UTC - INFO - process_done").unwrap_err();
        assert_eq!(err, MalformedLogLineError::TooFewTokens { found: 7 });
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        let line = LINE.replacen("2021-04-01", "someday", 1);
        let err = DoneRecord::parse(&line).unwrap_err();
        assert!(matches!(err, MalformedLogLineError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_select_done_lines() {
        let override_line = format!("{LINE} Moderator override");
        let lines = vec![
            LINE,
            "2021-04-01 12:00:00,000 UTC - INFO - claimed t3_x by someone",
            override_line.as_str(),
            "2021-04-01 12:00:00,000 UTC - INFO - PROCESS_DONE uppercase is not a marker",
        ];

        assert_eq!(select_done_lines(lines), vec![LINE]);
    }

    #[test]
    fn test_parse_done_lines_skips_malformed() {
        let lines = vec![LINE, "process_done too short"];
        let records = parse_done_lines(&lines);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "someuser");
    }

    #[test]
    fn test_serialize_done_record() {
        let record = DoneRecord {
            time: Utc.with_ymd_and_hms(2021, 4, 1, 12, 0, 0).unwrap(),
            post_id: "t3_abc".to_string(),
            username: "someuser".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2021-04-01 12:00:00+00:00","post_id":"t3_abc","username":"someuser"}"#
        );
    }
}
