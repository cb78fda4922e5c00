//! Transcriptions reconstructed from Reddit comments or the local cache.

mod classify;

pub use classify::{
    extract_components, extract_format_and_type, normalize_type, SEPARATOR, TYPE_RULES,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::Comment;
use crate::timestamp;

/// Serialized form of a transcription, as stored in `transcriptions.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    pub id: String,
    pub url: String,
    pub subreddit: String,
    pub username: String,
    #[serde(with = "timestamp::serde_format")]
    pub timestamp: DateTime<Utc>,
    pub body: String,
}

/// A transcription comment with its classified parts.
///
/// The derived fields are computed once from `body` when the value is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    pub id: String,
    pub url: String,
    pub subreddit: String,
    pub username: String,
    pub time: DateTime<Utc>,
    pub body: String,
    pub header: String,
    pub content: String,
    pub footer: String,
    /// Transcription format (`Image`, `Video`, `GIF`, ...), `None` if the header is unrecognised.
    pub format: Option<String>,
    /// Normalized content type (`Twitter`, `Chat`, ...), `None` if the header is unrecognised.
    pub kind: Option<String>,
}

impl Transcription {
    #[must_use]
    pub fn new(
        id: String,
        url: String,
        subreddit: String,
        username: String,
        time: DateTime<Utc>,
        body: String,
    ) -> Self {
        let (header, content, footer) = extract_components(&body);
        let (format, kind) = extract_format_and_type(&header);

        Self {
            id,
            url,
            subreddit,
            username,
            time,
            body,
            header,
            content,
            footer,
            format,
            kind,
        }
    }

    #[must_use]
    pub fn from_comment(comment: Comment) -> Self {
        Self::new(
            comment.id,
            comment.url,
            comment.subreddit,
            comment.author,
            comment.created,
            comment.body,
        )
    }

    #[must_use]
    pub fn from_record(record: TranscriptionRecord) -> Self {
        Self::new(
            record.id,
            record.url,
            record.subreddit,
            record.username,
            record.timestamp,
            record.body,
        )
    }

    #[must_use]
    pub fn to_record(&self) -> TranscriptionRecord {
        TranscriptionRecord {
            id: self.id.clone(),
            url: self.url.clone(),
            subreddit: self.subreddit.clone(),
            username: self.username.clone(),
            timestamp: self.time,
            body: self.body.clone(),
        }
    }

    /// Number of characters in the content.
    #[must_use]
    pub fn characters(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of words in the content.
    #[must_use]
    pub fn words(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BODY: &str = "*Image Transcription: Twitter*\n\n---\n\n**User** @user\n\nHällo wörld!\n\n---\n\n^^I'm&#32;a&#32;human&#32;volunteer";

    fn comment() -> Comment {
        Comment {
            id: "gxyz123".to_string(),
            url: "https://www.reddit.com/r/Example/comments/abc/title/gxyz123/".to_string(),
            subreddit: "Example".to_string(),
            author: "someuser".to_string(),
            created: Utc.with_ymd_and_hms(2021, 4, 1, 12, 0, 0).unwrap(),
            body: BODY.to_string(),
        }
    }

    #[test]
    fn test_from_comment_classifies() {
        let tr = Transcription::from_comment(comment());

        assert_eq!(tr.header, "*Image Transcription: Twitter*");
        assert_eq!(tr.content, "**User** @user\n\nHällo wörld!");
        assert_eq!(tr.footer, "^^I'm&#32;a&#32;human&#32;volunteer");
        assert_eq!(tr.format.as_deref(), Some("Image"));
        assert_eq!(tr.kind.as_deref(), Some("Twitter"));
        assert_eq!(tr.username, "someuser");
    }

    #[test]
    fn test_character_and_word_counts() {
        let tr = Transcription::from_comment(comment());

        // Counts characters, not bytes
        assert_eq!(tr.characters(), "**User** @user\n\nHällo wörld!".chars().count());
        assert_eq!(tr.characters(), 28);
        assert_eq!(tr.words(), 4);
    }

    #[test]
    fn test_record_round_trip_is_field_identical() {
        let fresh = Transcription::from_comment(comment());
        let json = serde_json::to_string(&fresh.to_record()).unwrap();
        let restored = Transcription::from_record(serde_json::from_str(&json).unwrap());

        assert_eq!(fresh, restored);
    }

    #[test]
    fn test_record_layout() {
        let record = Transcription::from_comment(comment()).to_record();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["timestamp"], "2021-04-01 12:00:00+00:00");
        assert_eq!(value["username"], "someuser");
        assert!(value.get("header").is_none());
    }

    #[test]
    fn test_unclassified_comment() {
        let tr = Transcription::new(
            "id".to_string(),
            "url".to_string(),
            "sub".to_string(),
            "user".to_string(),
            Utc::now(),
            "I'll do this one!".to_string(),
        );

        assert_eq!(tr.format, None);
        assert_eq!(tr.kind, None);
        assert_eq!(tr.characters(), 0);
        assert_eq!(tr.words(), 0);
    }
}
