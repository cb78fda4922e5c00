use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tor_log_analyzer::analyzer::analyze_logs;
use tor_log_analyzer::config::{CacheMode, Config};

/// Command-line arguments. Flags override the config file and environment.
#[derive(Parser, Debug)]
#[command(name = "tor-log-analyzer")]
#[command(about = "Build event statistics from the transcription bot's log")]
#[command(version)]
struct Args {
    /// Config file (.toml or .json)
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Bot log to analyze
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for reports, charts and the cache
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of entries shown in the top-N charts
    #[arg(short, long)]
    top_count: Option<usize>,

    /// Only use cached transcriptions, never query Reddit
    #[arg(long, conflicts_with = "no_cache")]
    force_cache: bool,

    /// Ignore the existing cache and fetch every transcription again
    #[arg(long)]
    no_cache: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input_file = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(top_count) = self.top_count {
            config.top_count = top_count;
        }
        if self.force_cache {
            config.cache_mode = CacheMode::ForceCache;
        } else if self.no_cache {
            config.cache_mode = CacheMode::NoCache;
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_tracing()?;

    info!("Starting tor-log-analyzer");

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        input = %config.input_file.display(),
        output = %config.output_dir.display(),
        event = config.event.name.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    analyze_logs(&config).await?;

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tor_log_analyzer=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
