//! Chart descriptions built from the aggregates.
//!
//! Rendering is left to whatever consumes the descriptions; the built-in
//! [`JsonChartSink`] writes each one as `<name>.chart.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::ColorConfig;
use crate::done::DoneRecord;
use crate::stats::{compress_top, CountData, RankedEntry, UserCharData, UserGammaData};

/// One chart, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub name: String,
    pub title: String,
    /// Event the chart belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(flatten)]
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// Horizontal bars, listed top to bottom.
    Bar {
        labels: Vec<String>,
        values: Vec<u64>,
        colors: Vec<String>,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<u64>,
        colors: Vec<String>,
    },
    Line {
        #[serde(serialize_with = "serialize_times")]
        times: Vec<DateTime<Utc>>,
        values: Vec<u64>,
        color: String,
    },
    Scatter {
        x: Vec<u64>,
        y: Vec<u64>,
        color: String,
    },
}

fn serialize_times<S: serde::Serializer>(
    times: &[DateTime<Utc>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(times.iter().map(crate::timestamp::format_timestamp))
}

/// Destination for chart descriptions.
#[async_trait]
pub trait ChartSink: Send + Sync {
    async fn write_chart(&self, chart: &Chart) -> Result<()>;
}

/// Writes every chart as pretty JSON into one directory.
#[derive(Debug, Clone)]
pub struct JsonChartSink {
    dir: PathBuf,
}

impl JsonChartSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

}

#[async_trait]
impl ChartSink for JsonChartSink {
    async fn write_chart(&self, chart: &Chart) -> Result<()> {
        let path = self.dir.join(format!("{}.chart.json", chart.name));
        let mut json = serde_json::to_string_pretty(chart).context("Failed to serialize chart")?;
        json.push('\n');

        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write chart: {}", path.display()))?;

        debug!(path = %path.display(), chart = %chart.name, "Wrote chart");
        Ok(())
    }
}

/// Cumulative number of done records over time.
///
/// `dones` must already be in time order.
#[must_use]
pub fn history(dones: &[DoneRecord], colors: &ColorConfig) -> Chart {
    Chart {
        name: "history".to_string(),
        title: "History".to_string(),
        subtitle: None,
        x_label: Some("Time".to_string()),
        y_label: Some("Total Transcriptions".to_string()),
        data: ChartData::Line {
            times: dones.iter().map(|done| done.time).collect(),
            values: (1..=dones.len() as u64).collect(),
            color: colors.primary.clone(),
        },
    }
}

#[must_use]
pub fn user_gamma(data: &UserGammaData, top_count: usize, colors: &ColorConfig) -> Chart {
    top_bar(
        "user_gamma",
        format!("Top {top_count} Contributors with the Most Transcriptions"),
        "User",
        prefixed(data, "u/"),
        top_count,
        "Other Volunteers",
        colors,
    )
}

#[must_use]
pub fn sub_gamma(data: &CountData, top_count: usize, colors: &ColorConfig) -> Chart {
    top_bar(
        "sub_gamma",
        format!("Top {top_count} Subreddits with the Most Transcriptions"),
        "Subreddit",
        prefixed(data, "r/"),
        top_count,
        "Other Subreddits",
        colors,
    )
}

#[must_use]
pub fn types(data: &CountData, top_count: usize, colors: &ColorConfig) -> Chart {
    top_bar(
        "types",
        format!("Top {top_count} Types"),
        "Type",
        prefixed(data, ""),
        top_count,
        "Other Types",
        colors,
    )
}

/// Format share pie with `"<format>\n<count> (<percent>%)"` labels.
#[must_use]
pub fn formats(data: &CountData, top_count: usize, colors: &ColorConfig) -> Chart {
    let ranked = compress_top(prefixed(data, ""), top_count, "Other Formats");
    let total: u64 = ranked.iter().map(|entry| entry.value).sum();

    let palette = [&colors.primary, &colors.secondary, &colors.tertiary];
    let mut palette_index = 0;
    let slice_colors = ranked
        .iter()
        .map(|entry| {
            if entry.is_other {
                colors.secondary.clone()
            } else {
                let color = palette[palette_index % palette.len()].clone();
                palette_index += 1;
                color
            }
        })
        .collect();

    let labels = ranked
        .iter()
        .map(|entry| {
            format!(
                "{}\n{} ({}%)",
                entry.label,
                entry.value,
                percent(entry.value, total)
            )
        })
        .collect();

    Chart {
        name: "formats".to_string(),
        title: format!("Top {top_count} Formats"),
        subtitle: None,
        x_label: None,
        y_label: None,
        data: ChartData::Pie {
            labels,
            values: ranked.iter().map(|entry| entry.value).collect(),
            colors: slice_colors,
        },
    }
}

/// Transcription count against median transcription length, one point per volunteer.
#[must_use]
pub fn user_count_length(
    user_gamma: &UserGammaData,
    user_chars: &UserCharData,
    colors: &ColorConfig,
) -> Chart {
    let (x, y) = user_chars
        .iter()
        .filter(|(username, _)| user_gamma.contains(username))
        .map(|(username, entry)| (entry.median() as u64, user_gamma.get_or_default(username)))
        .unzip();

    Chart {
        name: "user_count_length".to_string(),
        title: "Transcription Length vs. Transcription Count".to_string(),
        subtitle: None,
        x_label: Some("Transcription Length Median (Characters)".to_string()),
        y_label: Some("Transcription Count".to_string()),
        data: ChartData::Scatter {
            x,
            y,
            color: colors.primary.clone(),
        },
    }
}

/// Volunteers with the longest single transcription. Has no "other" bar.
#[must_use]
pub fn user_max_length(user_chars: &UserCharData, top_count: usize, colors: &ColorConfig) -> Chart {
    let entries = user_chars
        .iter()
        .map(|(username, entry)| (format!("u/{username}"), entry.maximum() as u64));
    let mut ranked = compress_top(entries, top_count, "");
    ranked.retain(|entry| !entry.is_other);

    bar_chart(
        "user_max_length",
        format!("Top {top_count} Contributors with the Longest Transcriptions"),
        "User",
        "Longest Transcription (Characters)",
        &ranked,
        colors,
    )
}

/// Every chart of a run, in the order they are emitted, each captioned with `caption`.
#[must_use]
pub fn all_charts(
    dones: &[DoneRecord],
    aggregates: &crate::stats::Aggregates,
    top_count: usize,
    colors: &ColorConfig,
    caption: Option<&str>,
) -> Vec<Chart> {
    let mut charts = vec![
        history(dones, colors),
        user_gamma(&aggregates.user_gamma, top_count, colors),
        sub_gamma(&aggregates.sub_gamma, top_count, colors),
        types(&aggregates.post_types, top_count, colors),
        formats(&aggregates.formats, top_count, colors),
        user_count_length(&aggregates.user_gamma, &aggregates.user_chars, colors),
        user_max_length(&aggregates.user_chars, top_count, colors),
    ];
    for chart in &mut charts {
        chart.subtitle = caption.map(str::to_string);
    }
    charts
}

fn prefixed(data: &CountData, prefix: &str) -> Vec<(String, u64)> {
    data.iter()
        .map(|(key, count)| (format!("{prefix}{key}"), count))
        .collect()
}

fn top_bar(
    name: &str,
    title: String,
    y_label: &str,
    entries: Vec<(String, u64)>,
    top_count: usize,
    other_label: &str,
    colors: &ColorConfig,
) -> Chart {
    let ranked = compress_top(entries, top_count, other_label);
    bar_chart(name, title, y_label, "Transcriptions", &ranked, colors)
}

fn bar_chart(
    name: &str,
    title: String,
    y_label: &str,
    x_label: &str,
    ranked: &[RankedEntry],
    colors: &ColorConfig,
) -> Chart {
    Chart {
        name: name.to_string(),
        title,
        subtitle: None,
        x_label: Some(x_label.to_string()),
        y_label: Some(y_label.to_string()),
        data: ChartData::Bar {
            labels: ranked.iter().map(|entry| entry.label.clone()).collect(),
            values: ranked.iter().map(|entry| entry.value).collect(),
            colors: ranked
                .iter()
                .map(|entry| {
                    if entry.is_other {
                        colors.secondary.clone()
                    } else {
                        colors.primary.clone()
                    }
                })
                .collect(),
        },
    }
}

/// Whole percentage of `value` in `total`, rounding halves to even.
fn percent(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = value * 100;
    let (quotient, remainder) = (scaled / total, scaled % total);
    match (remainder * 2).cmp(&total) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient % 2,
        std::cmp::Ordering::Less => quotient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn counts(keys: &[(&str, u64)]) -> CountData {
        let mut data = CountData::new();
        for (key, count) in keys {
            data.accumulate(key, *count);
        }
        data
    }

    fn bar(chart: &Chart) -> (&[String], &[u64], &[String]) {
        match &chart.data {
            ChartData::Bar {
                labels,
                values,
                colors,
            } => (labels.as_slice(), values.as_slice(), colors.as_slice()),
            other => panic!("expected bar chart, got {other:?}"),
        }
    }

    #[test]
    fn test_user_gamma_folds_other_volunteers() {
        let colors = ColorConfig::default();
        let data = counts(&[("a", 5), ("b", 1), ("c", 3), ("d", 1)]);

        let chart = user_gamma(&data, 2, &colors);
        let (labels, values, bar_colors) = bar(&chart);

        assert_eq!(chart.title, "Top 2 Contributors with the Most Transcriptions");
        assert_eq!(labels, ["u/a", "u/c", "Other Volunteers"]);
        assert_eq!(values, [5, 3, 2]);
        assert_eq!(
            bar_colors,
            [
                colors.primary.clone(),
                colors.primary.clone(),
                colors.secondary.clone()
            ]
        );
    }

    #[test]
    fn test_sub_gamma_without_other() {
        let chart = sub_gamma(&counts(&[("memes", 2)]), 10, &ColorConfig::default());
        let (labels, values, _) = bar(&chart);
        assert_eq!(labels, ["r/memes"]);
        assert_eq!(values, [2]);
    }

    #[test]
    fn test_formats_percent_labels() {
        let colors = ColorConfig::default();
        let data = counts(&[("Image", 3), ("Video", 1)]);

        let chart = formats(&data, 10, &colors);
        match &chart.data {
            ChartData::Pie {
                labels,
                values,
                colors: slice_colors,
            } => {
                assert_eq!(labels, &["Image\n3 (75%)", "Video\n1 (25%)"]);
                assert_eq!(values, &[3, 1]);
                assert_eq!(slice_colors, &[colors.primary.clone(), colors.secondary.clone()]);
            }
            other => panic!("expected pie chart, got {other:?}"),
        }
    }

    #[test]
    fn test_formats_percent_rounds_half_to_even() {
        let chart = formats(&counts(&[("B", 7), ("A", 1)]), 10, &ColorConfig::default());
        match &chart.data {
            ChartData::Pie { labels, .. } => {
                assert_eq!(labels, &["B\n7 (88%)", "A\n1 (12%)"]);
            }
            other => panic!("expected pie chart, got {other:?}"),
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 8), 12);
        assert_eq!(percent(3, 8), 38);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 1), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn test_history_is_cumulative() {
        let done = |hour| DoneRecord {
            time: Utc.with_ymd_and_hms(2021, 4, 1, hour, 0, 0).unwrap(),
            post_id: "t3_x".to_string(),
            username: "u".to_string(),
        };
        let chart = history(&[done(1), done(2), done(3)], &ColorConfig::default());

        match &chart.data {
            ChartData::Line { times, values, .. } => {
                assert_eq!(times.len(), 3);
                assert_eq!(values, &[1, 2, 3]);
            }
            other => panic!("expected line chart, got {other:?}"),
        }
    }

    #[test]
    fn test_user_count_length_scatter() {
        let gamma = counts(&[("a", 2), ("b", 1)]);
        let mut chars = UserCharData::new();
        chars.accumulate("a", 10);
        chars.accumulate("a", 30);
        chars.accumulate("b", 7);

        let chart = user_count_length(&gamma, &chars, &ColorConfig::default());
        match &chart.data {
            ChartData::Scatter { x, y, .. } => {
                assert_eq!(x, &[30, 7]);
                assert_eq!(y, &[2, 1]);
            }
            other => panic!("expected scatter chart, got {other:?}"),
        }
    }

    #[test]
    fn test_user_max_length_has_no_other_bar() {
        let mut chars = UserCharData::new();
        chars.accumulate("a", 10);
        chars.accumulate("b", 50);
        chars.accumulate("c", 20);

        let chart = user_max_length(&chars, 2, &ColorConfig::default());
        let (labels, values, _) = bar(&chart);
        assert_eq!(labels, ["u/b", "u/c"]);
        assert_eq!(values, [50, 20]);
    }

    #[test]
    fn test_all_charts_carry_caption() {
        let aggregates = crate::stats::Aggregates::default();
        let colors = ColorConfig::default();

        let charts = all_charts(&[], &aggregates, 10, &colors, Some("Transcription Day (TD)"));
        assert_eq!(charts.len(), 7);
        assert!(charts
            .iter()
            .all(|chart| chart.subtitle.as_deref() == Some("Transcription Day (TD)")));

        let uncaptioned = all_charts(&[], &aggregates, 10, &colors, None);
        let value = serde_json::to_value(&uncaptioned[0]).unwrap();
        assert!(value.get("subtitle").is_none());
    }

    #[tokio::test]
    async fn test_json_chart_sink() {
        let dir = TempDir::new().unwrap();
        let sink = JsonChartSink::new(dir.path());
        let chart = types(&counts(&[("Twitter", 4)]), 10, &ColorConfig::default());

        sink.write_chart(&chart).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("types.chart.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["kind"], "bar");
        assert_eq!(value["title"], "Top 10 Types");
        assert_eq!(value["labels"], serde_json::json!(["Twitter"]));
        assert_eq!(value["values"], serde_json::json!([4]));
    }
}
