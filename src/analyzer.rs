//! The full analysis run, from raw log text to reports and charts.

use anyhow::{Context, Result};
use tracing::info;

use crate::cache::{TranscriptionCache, CACHE_FILE_NAME};
use crate::config::{CacheMode, ColorConfig, Config};
use crate::done::{parse_done_lines, select_done_lines, DoneRecord};
use crate::reconcile::resolve;
use crate::report::{charts, Artifact, ChartSink, FileReportSink, JsonChartSink, ReportSink};
use crate::source::{CommentSource, RedditClient};
use crate::stats::{user_gamma_from_dones, Aggregates, UserGammaData};
use crate::transcription::Transcription;
use crate::window::EventWindow;

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Done records inside the event window.
    pub dones: Vec<DoneRecord>,
    /// Done records per volunteer inside the event window.
    pub done_user_gamma: UserGammaData,
    /// Transcriptions inside the event window, in time order.
    pub transcriptions: Vec<Transcription>,
    pub aggregates: Aggregates,
}

/// One analysis run over a log, wired to its collaborators.
pub struct Analyzer<'a> {
    pub window: EventWindow,
    pub cache_mode: CacheMode,
    pub top_count: usize,
    pub colors: ColorConfig,
    /// Event line shown under every chart title.
    pub caption: Option<String>,
    pub source: &'a dyn CommentSource,
    pub reports: &'a dyn ReportSink,
    pub charts: &'a dyn ChartSink,
}

impl Analyzer<'_> {
    /// Run the pipeline over `log_text`.
    ///
    /// Artifacts are written in this order: `done.log`, `done.json`,
    /// `done_user_gamma.json`, then the aggregates, then one chart
    /// description per chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache or an artifact cannot be written.
    pub async fn process(&self, log_text: &str, cache: &mut TranscriptionCache) -> Result<Analysis> {
        let lines = select_done_lines(log_text.lines());
        self.reports
            .write_artifact(&Artifact::DoneLog(&lines))
            .await?;

        let dones = parse_done_lines(&lines);
        self.reports.write_artifact(&Artifact::Dones(&dones)).await?;
        info!(lines = lines.len(), dones = dones.len(), "Parsed done records");

        let dones = self.window.filter_dones(dones);
        info!(dones = dones.len(), "Done records inside event window");

        let done_user_gamma = user_gamma_from_dones(&dones);
        self.reports
            .write_artifact(&Artifact::DoneUserGamma(&done_user_gamma))
            .await?;

        let transcriptions = resolve(&dones, cache, self.source, self.cache_mode).await?;
        let transcriptions = self.window.filter_transcriptions(transcriptions);
        info!(
            transcriptions = transcriptions.len(),
            "Transcriptions inside event window"
        );

        let aggregates = Aggregates::from_transcriptions(&transcriptions);
        self.write_aggregates(&aggregates).await?;

        let charts = charts::all_charts(
            &dones,
            &aggregates,
            self.top_count,
            &self.colors,
            self.caption.as_deref(),
        );
        for chart in &charts {
            self.charts.write_chart(chart).await?;
        }

        Ok(Analysis {
            dones,
            done_user_gamma,
            transcriptions,
            aggregates,
        })
    }

    async fn write_aggregates(&self, aggregates: &Aggregates) -> Result<()> {
        let artifacts = [
            Artifact::UserGamma(&aggregates.user_gamma),
            Artifact::UserList(&aggregates.user_gamma),
            Artifact::UserChars(&aggregates.user_chars),
            Artifact::SubGamma(&aggregates.sub_gamma),
            Artifact::SubList(&aggregates.sub_gamma),
            Artifact::PostTypes(&aggregates.post_types),
            Artifact::Formats(&aggregates.formats),
        ];

        for artifact in &artifacts {
            self.reports.write_artifact(artifact).await?;
        }
        Ok(())
    }
}

/// Analyze the configured log file, writing everything under the output directory.
///
/// # Errors
///
/// Returns an error if the output directories cannot be created, the input
/// cannot be read, or any output cannot be written.
pub async fn analyze_logs(config: &Config) -> Result<Analysis> {
    let cache_dir = config.cache_dir();
    let image_dir = config.image_dir();

    for dir in [&config.output_dir, &cache_dir, &image_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    let log_text = tokio::fs::read_to_string(&config.input_file)
        .await
        .with_context(|| format!("Failed to read input file: {}", config.input_file.display()))?;

    let cache_path = cache_dir.join(CACHE_FILE_NAME);
    let mut cache = match config.cache_mode {
        CacheMode::NoCache => TranscriptionCache::empty(cache_path),
        CacheMode::Normal | CacheMode::ForceCache => TranscriptionCache::load(cache_path).await,
    };
    info!(
        entries = cache.len(),
        mode = ?config.cache_mode,
        "Transcription cache ready"
    );

    let source = RedditClient::new(&config.reddit).context("Failed to initialize Reddit client")?;
    let reports = FileReportSink::new(&cache_dir);
    let chart_sink = JsonChartSink::new(&image_dir);

    let analyzer = Analyzer {
        window: config.event.window(),
        cache_mode: config.cache_mode,
        top_count: config.top_count,
        colors: config.colors.clone(),
        caption: config.event.caption(),
        source: &source,
        reports: &reports,
        charts: &chart_sink,
    };

    let analysis = analyzer.process(&log_text, &mut cache).await?;
    info!(
        dones = analysis.dones.len(),
        transcriptions = analysis.transcriptions.len(),
        volunteers = analysis.aggregates.user_gamma.len(),
        output = %config.output_dir.display(),
        "Analysis complete"
    );
    Ok(analysis)
}
