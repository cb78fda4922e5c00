//! Comment source backed by Reddit's public JSON API.
//!
//! A done post on the transcription subreddit links to the post that was
//! transcribed. The transcription itself is a comment by the volunteer on
//! that linked post, sometimes continued in replies to itself when it was too
//! long for a single comment.
//!
//! Large threads only return part of their comments; the rest hide behind
//! "more" stubs that are loaded through `/api/morechildren` until the
//! volunteer's comment turns up or nothing is left to load.

use std::collections::{HashSet, VecDeque};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::traits::{Comment, CommentSource};
use crate::config::RedditConfig;
use crate::constants::DEFAULT_REDDIT_BASE_URL;

/// Most comment ids Reddit accepts in one `/api/morechildren` request.
const MORE_CHILDREN_BATCH: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: serde_json::Value,
}

impl Thing {
    fn into_post(self) -> Option<RawPost> {
        if self.kind != "t3" {
            return None;
        }
        serde_json::from_value(self.data).ok()
    }
}

#[derive(Debug, Deserialize)]
struct RawPost {
    url: String,
}

/// Placeholder for comments left out of a listing.
#[derive(Debug, Deserialize)]
struct RawMore {
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    body: String,
    created_utc: f64,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    permalink: String,
    /// Either an empty string or a listing of child comments.
    #[serde(default)]
    replies: serde_json::Value,
}

impl RawComment {
    fn is_by(&self, username: &str) -> bool {
        self.author.eq_ignore_ascii_case(username)
    }

    fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }

    fn take_replies(&mut self) -> Vec<Thing> {
        let replies = std::mem::take(&mut self.replies);
        if !replies.is_object() {
            return Vec::new();
        }
        serde_json::from_value::<Listing>(replies)
            .map(|listing| listing.data.children)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Default, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    data: MoreChildrenData,
}

#[derive(Debug, Default, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

/// Every comment loaded so far for one post, flattened breadth-first.
///
/// Each comment keeps the fullname of its parent, so reply chains can be
/// followed regardless of which request loaded them.
#[derive(Debug, Default)]
struct CommentPool {
    comments: Vec<RawComment>,
    loaded: HashSet<String>,
    requested: HashSet<String>,
    pending: VecDeque<String>,
}

impl CommentPool {
    /// Add listing children and their nested replies. Returns the number of new comments.
    fn add(&mut self, things: Vec<Thing>) -> usize {
        let mut queue: VecDeque<(Thing, Option<String>)> =
            things.into_iter().map(|thing| (thing, None)).collect();
        let mut added = 0;

        while let Some((thing, parent)) = queue.pop_front() {
            match thing.kind.as_str() {
                "t1" => {
                    let Ok(mut comment) = serde_json::from_value::<RawComment>(thing.data) else {
                        continue;
                    };
                    if self.loaded.contains(&comment.id) {
                        continue;
                    }
                    if let Some(parent) = parent {
                        if comment.parent_id.is_empty() {
                            comment.parent_id = parent;
                        }
                    }

                    let fullname = comment.fullname();
                    queue.extend(
                        comment
                            .take_replies()
                            .into_iter()
                            .map(|reply| (reply, Some(fullname.clone()))),
                    );

                    self.loaded.insert(comment.id.clone());
                    self.comments.push(comment);
                    added += 1;
                }
                "more" => {
                    let Ok(more) = serde_json::from_value::<RawMore>(thing.data) else {
                        continue;
                    };
                    // "_" marks a "continue this thread" link, which has no ids to load
                    for id in more.children {
                        if id == "_" || self.loaded.contains(&id) {
                            continue;
                        }
                        if self.requested.insert(id.clone()) {
                            self.pending.push_back(id);
                        }
                    }
                }
                _ => {}
            }
        }

        added
    }

    fn next_batch(&mut self) -> Vec<String> {
        let size = self.pending.len().min(MORE_CHILDREN_BATCH);
        self.pending.drain(..size).collect()
    }

    /// First comment by `username` in breadth-first order.
    fn find_by_author(&self, username: &str) -> Option<&RawComment> {
        self.comments.iter().find(|comment| comment.is_by(username))
    }

    fn continuation_of(&self, comment: &RawComment, username: &str) -> Option<&RawComment> {
        let fullname = comment.fullname();
        self.comments
            .iter()
            .find(|reply| reply.parent_id == fullname && reply.is_by(username))
    }

    /// Merge a transcription with the chain of replies its author continued it in.
    fn combine_continuations(&self, root: &RawComment, username: &str) -> Result<Comment> {
        let mut body = root.body.clone();
        let mut current = root;

        // Bounded by the pool size so malformed parent ids cannot loop forever
        for _ in 0..self.comments.len() {
            let Some(next) = self.continuation_of(current, username) else {
                break;
            };
            body.push_str("\n\n");
            body.push_str(&next.body);
            current = next;
        }

        let created = DateTime::from_timestamp(root.created_utc as i64, 0)
            .with_context(|| format!("Invalid creation time for comment {}", root.id))?;

        Ok(Comment {
            id: root.id.clone(),
            url: format!("{DEFAULT_REDDIT_BASE_URL}{}", root.permalink),
            subreddit: root.subreddit.clone(),
            author: root.author.clone(),
            created,
            body,
        })
    }
}

/// Reddit API client used to look up transcription comments.
#[derive(Debug, Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RedditConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("Reddit returned status {} for {url}", response.status());
        }

        let data = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))?;
        Ok(Some(data))
    }

    /// Path of the post the transcription-subreddit post links to.
    async fn target_path(&self, post_id: &str) -> Result<Option<String>> {
        let fullname = if post_id.starts_with("t3_") {
            post_id.to_string()
        } else {
            format!("t3_{post_id}")
        };

        let Some(listing) = self
            .get_json::<Listing>(&format!("/by_id/{fullname}.json"), &[])
            .await?
        else {
            return Ok(None);
        };

        Ok(listing
            .data
            .children
            .into_iter()
            .find_map(Thing::into_post)
            .and_then(|post| reddit_path(&post.url)))
    }

    /// Load the comments hidden behind "more" stubs.
    async fn more_children(&self, link_id: &str, ids: &[String]) -> Result<Vec<Thing>> {
        let children = ids.join(",");
        let response = self
            .get_json::<MoreChildrenResponse>(
                "/api/morechildren.json",
                &[
                    ("api_type", "json"),
                    ("link_id", link_id),
                    ("children", children.as_str()),
                ],
            )
            .await?;

        Ok(response
            .map(|response| response.json.data.things)
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommentSource for RedditClient {
    async fn fetch_transcription_comment(
        &self,
        post_id: &str,
        username: &str,
    ) -> Result<Option<Comment>> {
        let Some(path) = self.target_path(post_id).await? else {
            debug!(post_id = %post_id, "Linked post not found");
            return Ok(None);
        };

        let Some(listings) = self
            .get_json::<Vec<Listing>>(&format!("{path}.json"), &[])
            .await?
        else {
            debug!(post_id = %post_id, path = %path, "Linked post has no comment listing");
            return Ok(None);
        };

        let mut pool = CommentPool::default();
        if let Some(listing) = listings.into_iter().nth(1) {
            pool.add(listing.data.children);
        }
        let link = link_id(&path);

        loop {
            if let Some(root) = pool.find_by_author(username) {
                return pool.combine_continuations(root, username).map(Some);
            }

            let Some(link) = link.as_deref() else {
                break;
            };
            let batch = pool.next_batch();
            if batch.is_empty() {
                break;
            }

            let things = self.more_children(link, &batch).await?;
            let added = pool.add(things);
            debug!(
                post_id = %post_id,
                requested = batch.len(),
                added,
                "Loaded more comments"
            );
        }

        debug!(post_id = %post_id, username = %username, "No comment by volunteer");
        Ok(None)
    }
}

/// Path component of a Reddit post URL, without a trailing slash.
fn reddit_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host != "reddit.com" && !host.ends_with(".reddit.com") {
        return None;
    }
    let path = parsed.path().trim_end_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

/// Fullname of the post behind a `/r/<sub>/comments/<id>/...` path.
fn link_id(path: &str) -> Option<String> {
    let mut segments = path.split('/');
    segments.by_ref().find(|segment| *segment == "comments")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(|id| format!("t3_{id}"))
}
