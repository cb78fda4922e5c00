use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::done::DoneRecord;
use crate::stats::{CountData, FormatData, PostTypeData, SubGammaData, UserCharData, UserGammaData};

/// An intermediate result written during a run.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    /// The selected done lines, unparsed.
    DoneLog(&'a [&'a str]),
    Dones(&'a [DoneRecord]),
    /// Done records per volunteer inside the event window, found or not.
    DoneUserGamma(&'a UserGammaData),
    UserGamma(&'a UserGammaData),
    /// Volunteers with their transcription counts, one per line.
    UserList(&'a UserGammaData),
    UserChars(&'a UserCharData),
    SubGamma(&'a SubGammaData),
    /// Subreddits with their transcription counts, one per line.
    SubList(&'a SubGammaData),
    PostTypes(&'a PostTypeData),
    Formats(&'a FormatData),
}

impl Artifact<'_> {
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::DoneLog(_) => "done.log",
            Self::Dones(_) => "done.json",
            Self::DoneUserGamma(_) => "done_user_gamma.json",
            Self::UserGamma(_) => "user_gamma.json",
            Self::UserList(_) => "user_list.txt",
            Self::UserChars(_) => "user_chars.json",
            Self::SubGamma(_) => "sub_gamma.json",
            Self::SubList(_) => "sub_list.txt",
            Self::PostTypes(_) => "post_types.json",
            Self::Formats(_) => "formats.json",
        }
    }

    /// Render the artifact to the exact file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self) -> Result<String> {
        match self {
            // No trailing newline, matching the input lines exactly
            Self::DoneLog(lines) => Ok(lines.join("\n")),
            Self::Dones(dones) => to_json(dones),
            Self::DoneUserGamma(data)
            | Self::UserGamma(data)
            | Self::SubGamma(data)
            | Self::PostTypes(data)
            | Self::Formats(data) => to_json(data),
            Self::UserChars(data) => to_json(data),
            Self::UserList(data) => Ok(render_list(data, "u/")),
            Self::SubList(data) => Ok(render_list(data, "r/")),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize artifact")?;
    json.push('\n');
    Ok(json)
}

/// One `- <prefix><name>: <count>` line per entry, always ending in a newline.
fn render_list(data: &CountData, prefix: &str) -> String {
    let mut lines = data
        .sorted_by_key()
        .into_iter()
        .map(|(name, count)| format!("- {prefix}{name}: {count}"))
        .collect::<Vec<_>>()
        .join("\n");
    lines.push('\n');
    lines
}

/// Destination for run artifacts.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write_artifact(&self, artifact: &Artifact<'_>) -> Result<()>;
}

/// Writes every artifact as a file into one directory.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn write_artifact(&self, artifact: &Artifact<'_>) -> Result<()> {
        let path = self.dir.join(artifact.file_name());
        let contents = artifact.render()?;

        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write artifact: {}", path.display()))?;

        debug!(path = %path.display(), "Wrote artifact");
        Ok(())
    }
}
