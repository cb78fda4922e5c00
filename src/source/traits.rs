use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A transcription comment as returned by a [`CommentSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment ID (without the `t1_` prefix).
    pub id: String,
    /// Permalink to the comment.
    pub url: String,
    /// Subreddit the transcribed post belongs to.
    pub subreddit: String,
    /// Comment author.
    pub author: String,
    /// Creation time of the comment.
    pub created: DateTime<Utc>,
    /// Comment body. When a transcription is continued in replies by the same
    /// author, this holds the combined text in reply order.
    pub body: String,
}

/// Source of transcription comments for done posts.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch the transcription `username` left for the post behind `post_id`.
    ///
    /// # Arguments
    ///
    /// * `post_id` - Full name of the post on the transcription subreddit (`t3_...`)
    /// * `username` - Volunteer who marked the post as done
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried. A post or comment
    /// that doesn't exist is `Ok(None)`, not an error.
    async fn fetch_transcription_comment(
        &self,
        post_id: &str,
        username: &str,
    ) -> Result<Option<Comment>>;
}
