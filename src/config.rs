use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::{DEFAULT_REDDIT_BASE_URL, DEFAULT_USER_AGENT};
use crate::timestamp::parse_timestamp;
use crate::window::EventWindow;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
    #[error("failed to parse {name} as a timestamp: {value}")]
    ParseTimestamp { name: String, value: String },
    #[error("unsupported config file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which side of the transcription cache a run may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Use cached transcriptions and fetch the rest.
    #[default]
    Normal,
    /// Only use cached transcriptions, never fetch.
    ForceCache,
    /// Ignore the existing cache and fetch everything again.
    NoCache,
}

/// The event the statistics are generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventConfig {
    pub name: Option<String>,
    pub abrv: Option<String>,
    pub organization: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl EventConfig {
    #[must_use]
    pub fn window(&self) -> EventWindow {
        EventWindow::new(self.start, self.end)
    }

    /// Event line shown under chart titles, e.g. `Transcription Day (TD), r/TranscribersOfReddit`.
    #[must_use]
    pub fn caption(&self) -> Option<String> {
        let title = match (non_empty(self.name.as_deref()), non_empty(self.abrv.as_deref())) {
            (Some(name), Some(abrv)) => Some(format!("{name} ({abrv})")),
            (Some(name), None) => Some(name.to_string()),
            (None, Some(abrv)) => Some(abrv.to_string()),
            (None, None) => None,
        };

        match (title, non_empty(self.organization.as_deref())) {
            (Some(title), Some(organization)) => Some(format!("{title}, {organization}")),
            (Some(title), None) => Some(title),
            (None, organization) => organization.map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Chart colors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
    pub background: String,
    pub text: String,
    pub line: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "#80cbc4".to_string(),
            secondary: "#438078".to_string(),
            tertiary: "#2b524d".to_string(),
            background: "#232323".to_string(),
            text: "#fff".to_string(),
            line: "#484848".to_string(),
        }
    }
}

/// Reddit API access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REDDIT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Application configuration.
///
/// Built from defaults, then an optional config file, then environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub top_count: usize,
    pub cache_mode: CacheMode,
    pub event: EventConfig,
    pub colors: ColorConfig,
    pub reddit: RedditConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("input/input.log"),
            output_dir: PathBuf::from("output"),
            top_count: 10,
            cache_mode: CacheMode::Normal,
            event: EventConfig::default(),
            colors: ColorConfig::default(),
            reddit: RedditConfig::default(),
        }
    }
}

/// Config file layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct FileConfig {
    input_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    top_count: Option<usize>,
    force_cache: Option<bool>,
    no_cache: Option<bool>,
    event: FileEventConfig,
    colors: Option<ColorConfig>,
    reddit: FileRedditConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct FileEventConfig {
    name: Option<String>,
    abrv: Option<String>,
    organization: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct FileRedditConfig {
    base_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from an optional config file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or an
    /// environment variable holds an invalid value.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            config.merge_file(read_config_file(path)?)?;
        }
        config.merge_env()?;
        Ok(config)
    }

    /// Directory for intermediate artifacts and the transcription cache.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.output_dir.join(".cache")
    }

    /// Directory charts are written to.
    #[must_use]
    pub fn image_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_count == 0 {
            return Err(ConfigError::InvalidValue {
                name: "TOP_COUNT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.input_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "INPUT_FILE".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if let (Some(start), Some(end)) = (self.event.start, self.event.end) {
            if start >= end {
                return Err(ConfigError::InvalidValue {
                    name: "EVENT_END".to_string(),
                    message: "must be after the event start".to_string(),
                });
            }
        }
        if url::Url::parse(&self.reddit.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "REDDIT_BASE_URL".to_string(),
                message: format!("not a valid URL: '{}'", self.reddit.base_url),
            });
        }
        Ok(())
    }

    fn merge_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(input_file) = file.input_file {
            self.input_file = input_file;
        }
        if let Some(output_dir) = file.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(top_count) = file.top_count {
            self.top_count = top_count;
        }
        self.cache_mode = cache_mode(
            file.force_cache.unwrap_or(false),
            file.no_cache.unwrap_or(false),
        )?;

        let event = file.event;
        self.event.name = event.name.or(self.event.name.take());
        self.event.abrv = event.abrv.or(self.event.abrv.take());
        self.event.organization = event.organization.or(self.event.organization.take());
        if let Some(start) = event.start {
            self.event.start = Some(timestamp_value("event.start", &start)?);
        }
        if let Some(end) = event.end {
            self.event.end = Some(timestamp_value("event.end", &end)?);
        }

        if let Some(colors) = file.colors {
            self.colors = colors;
        }

        if let Some(base_url) = file.reddit.base_url {
            self.reddit.base_url = base_url;
        }
        if let Some(user_agent) = file.reddit.user_agent {
            self.reddit.user_agent = user_agent;
        }
        if let Some(timeout_secs) = file.reddit.timeout_secs {
            self.reddit.timeout = Duration::from_secs(timeout_secs);
        }

        Ok(())
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Some(input_file) = optional_env("INPUT_FILE") {
            self.input_file = PathBuf::from(input_file);
        }
        if let Some(output_dir) = optional_env("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }
        self.top_count = parse_env_usize("TOP_COUNT", self.top_count)?;

        let force_cache = parse_env_bool("FORCE_CACHE", self.cache_mode == CacheMode::ForceCache)?;
        let no_cache = parse_env_bool("NO_CACHE", self.cache_mode == CacheMode::NoCache)?;
        self.cache_mode = cache_mode(force_cache, no_cache)?;

        if let Some(name) = optional_env("EVENT_NAME") {
            self.event.name = Some(name);
        }
        if let Some(start) = optional_env("EVENT_START") {
            self.event.start = Some(timestamp_value("EVENT_START", &start)?);
        }
        if let Some(end) = optional_env("EVENT_END") {
            self.event.end = Some(timestamp_value("EVENT_END", &end)?);
        }

        self.reddit.base_url = env_or_default("REDDIT_BASE_URL", &self.reddit.base_url);
        self.reddit.user_agent = env_or_default("REDDIT_USER_AGENT", &self.reddit.user_agent);
        self.reddit.timeout = Duration::from_secs(parse_env_u64(
            "REDDIT_TIMEOUT_SECS",
            self.reddit.timeout.as_secs(),
        )?);

        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let is_toml = match extension.as_deref() {
        Some("toml") => true,
        Some("json") => false,
        _ => return Err(ConfigError::UnsupportedExtension(path.to_path_buf())),
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if is_toml {
        Ok(toml::from_str(&raw)?)
    } else {
        Ok(serde_json::from_str(&raw)?)
    }
}

fn cache_mode(force_cache: bool, no_cache: bool) -> Result<CacheMode, ConfigError> {
    match (force_cache, no_cache) {
        (true, true) => Err(ConfigError::InvalidValue {
            name: "FORCE_CACHE".to_string(),
            message: "cannot be combined with NO_CACHE".to_string(),
        }),
        (true, false) => Ok(CacheMode::ForceCache),
        (false, true) => Ok(CacheMode::NoCache),
        (false, false) => Ok(CacheMode::Normal),
    }
}

fn timestamp_value(name: &str, value: &str) -> Result<DateTime<Utc>, ConfigError> {
    parse_timestamp(value).ok_or_else(|| ConfigError::ParseTimestamp {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "INPUT_FILE",
        "OUTPUT_DIR",
        "TOP_COUNT",
        "FORCE_CACHE",
        "NO_CACHE",
        "EVENT_NAME",
        "EVENT_START",
        "EVENT_END",
        "REDDIT_BASE_URL",
        "REDDIT_USER_AGENT",
        "REDDIT_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::load(None).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.cache_dir(), PathBuf::from("output/.cache"));
        assert_eq!(config.image_dir(), PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_toml_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "config.toml",
            r##"
input-file = "logs/bot.log"
top-count = 5
force-cache = true

[event]
name = "Transcription Day"
start = "2021-04-01 00:00 UTC"
end = "2021-04-02T00:00:00Z"

[colors]
primary = "#ff0000"
"##,
        );

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.input_file, PathBuf::from("logs/bot.log"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.top_count, 5);
        assert_eq!(config.cache_mode, CacheMode::ForceCache);
        assert_eq!(config.event.name.as_deref(), Some("Transcription Day"));
        assert_eq!(config.event.start, parse_timestamp("2021-04-01"));
        assert_eq!(config.event.end, parse_timestamp("2021-04-02"));
        assert_eq!(config.colors.primary, "#ff0000");
        assert_eq!(config.colors.secondary, ColorConfig::default().secondary);
    }

    #[test]
    #[serial]
    fn test_json_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "config.json",
            r#"{ "output-dir": "out", "reddit": { "timeout-secs": 5 } }"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.reddit.timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_unsupported_extension() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "config.yaml", "top-count: 3");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedExtension(_)));
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        clear_env();
        let err = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "config.toml", "top-count = 5\n");

        std::env::set_var("TOP_COUNT", "7");
        std::env::set_var("NO_CACHE", "yes");
        std::env::set_var("EVENT_END", "2021-04-02 12:00");
        let config = Config::load(Some(&path));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.top_count, 7);
        assert_eq!(config.cache_mode, CacheMode::NoCache);
        assert_eq!(config.event.end, parse_timestamp("2021-04-02T12:00:00Z"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        clear_env();
        std::env::set_var("TOP_COUNT", "many");
        assert!(matches!(Config::load(None), Err(ConfigError::ParseInt { .. })));
        clear_env();

        std::env::set_var("FORCE_CACHE", "maybe");
        assert!(matches!(Config::load(None), Err(ConfigError::ParseBool { .. })));
        clear_env();

        std::env::set_var("EVENT_START", "soon");
        assert!(matches!(Config::load(None), Err(ConfigError::ParseTimestamp { .. })));
        clear_env();
    }

    #[test]
    fn test_cache_mode() {
        assert_eq!(cache_mode(false, false).unwrap(), CacheMode::Normal);
        assert_eq!(cache_mode(true, false).unwrap(), CacheMode::ForceCache);
        assert_eq!(cache_mode(false, true).unwrap(), CacheMode::NoCache);
        assert!(cache_mode(true, true).is_err());
    }

    #[test]
    fn test_event_caption() {
        let mut event = EventConfig {
            name: Some("Transcription Day".to_string()),
            abrv: Some("TD".to_string()),
            organization: Some("r/TranscribersOfReddit".to_string()),
            ..EventConfig::default()
        };
        assert_eq!(
            event.caption().as_deref(),
            Some("Transcription Day (TD), r/TranscribersOfReddit")
        );

        event.abrv = Some("  ".to_string());
        event.organization = None;
        assert_eq!(event.caption().as_deref(), Some("Transcription Day"));

        event.name = None;
        event.organization = Some("r/TranscribersOfReddit".to_string());
        assert_eq!(event.caption().as_deref(), Some("r/TranscribersOfReddit"));

        assert_eq!(EventConfig::default().caption(), None);
    }

    #[test]
    fn test_validate() {
        let mut config = Config {
            top_count: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.top_count = 3;
        config.event.start = parse_timestamp("2021-04-02");
        config.event.end = parse_timestamp("2021-04-01");
        assert!(config.validate().is_err());

        config.event.end = parse_timestamp("2021-04-03");
        assert!(config.validate().is_ok());

        config.reddit.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
