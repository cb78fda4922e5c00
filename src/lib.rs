//! Transcription log analyzer library.
//!
//! Reads the moderation bot's log, pairs every completed post with the
//! volunteer's transcription comment on Reddit, and produces per-volunteer,
//! per-subreddit, per-type and per-format statistics for an event.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod constants;
pub mod done;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod stats;
pub mod timestamp;
pub mod transcription;
pub mod window;
