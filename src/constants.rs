//! Shared constants used across the application.

/// User agent sent with every Reddit API request.
///
/// Reddit throttles generic agents, so this follows their
/// `<platform>:<app id>:<version> (by u/<author>)` convention.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "rust:tor-log-analyzer:v",
    env!("CARGO_PKG_VERSION"),
    " (by u/tor-log-analyzer)"
);

/// Default Reddit API base URL.
pub const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Marker present in every log line that records a completed transcription.
pub const DONE_MARKER: &str = "process_done";

/// Marker for done lines forced through by a moderator; these are not real completions.
pub const MODERATOR_OVERRIDE_MARKER: &str = "Moderator override";

/// Extra time after the event end during which done records are still accepted.
pub const DONE_GRACE_PERIOD_HOURS: i64 = 2;

/// Key used for transcriptions whose header could not be classified.
pub const UNCLASSIFIED_KEY: &str = "null";
