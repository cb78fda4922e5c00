//! Pairs done records with their transcription comments.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::cache::TranscriptionCache;
use crate::config::CacheMode;
use crate::done::DoneRecord;
use crate::source::CommentSource;
use crate::transcription::Transcription;

/// Counters of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub cached: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Resolve every done record to a transcription.
///
/// Cached transcriptions are reused as-is. Anything else is fetched from
/// `source` (unless `mode` is [`CacheMode::ForceCache`]) and written through
/// to `cache` right away. Records without a transcription comment, or whose
/// fetch fails, are left out.
///
/// Several done records for the same post yield one transcription. The
/// result is sorted by transcription time.
///
/// # Errors
///
/// Returns an error if the cache cannot be written.
pub async fn resolve(
    dones: &[DoneRecord],
    cache: &mut TranscriptionCache,
    source: &dyn CommentSource,
    mode: CacheMode,
) -> Result<Vec<Transcription>> {
    let (transcriptions, stats) = resolve_with_stats(dones, cache, source, mode).await?;
    info!(
        transcriptions = transcriptions.len(),
        cached = stats.cached,
        fetched = stats.fetched,
        not_found = stats.not_found,
        failed = stats.failed,
        skipped = stats.skipped,
        "Resolved done records"
    );
    Ok(transcriptions)
}

/// Like [`resolve`], also returning the counters of the pass.
///
/// # Errors
///
/// Returns an error if the cache cannot be written.
pub async fn resolve_with_stats(
    dones: &[DoneRecord],
    cache: &mut TranscriptionCache,
    source: &dyn CommentSource,
    mode: CacheMode,
) -> Result<(Vec<Transcription>, ResolveStats)> {
    let mut stats = ResolveStats::default();
    let mut resolved: IndexMap<String, Transcription> = IndexMap::new();

    for (index, done) in dones.iter().enumerate() {
        if let Some(cached) = cache.get(&done.post_id) {
            stats.cached += 1;
            resolved.insert(done.post_id.clone(), cached.clone());
            continue;
        }

        if mode == CacheMode::ForceCache {
            stats.skipped += 1;
            continue;
        }

        debug!(
            post_id = %done.post_id,
            username = %done.username,
            progress = %format!("{}/{}", index + 1, dones.len()),
            "Fetching transcription"
        );

        let comment = match source
            .fetch_transcription_comment(&done.post_id, &done.username)
            .await
        {
            Ok(Some(comment)) => comment,
            Ok(None) => {
                debug!(post_id = %done.post_id, username = %done.username, "No transcription found");
                stats.not_found += 1;
                continue;
            }
            Err(e) => {
                warn!(post_id = %done.post_id, username = %done.username, "Failed to fetch transcription: {e:#}");
                stats.failed += 1;
                continue;
            }
        };

        let transcription = Transcription::from_comment(comment);
        cache
            .put(&done.post_id, transcription.clone())
            .await
            .with_context(|| format!("Failed to cache transcription for {}", done.post_id))?;

        stats.fetched += 1;
        resolved.insert(done.post_id.clone(), transcription);
    }

    let mut transcriptions: Vec<Transcription> = resolved.into_values().collect();
    transcriptions.sort_by_key(|tr| tr.time);

    Ok((transcriptions, stats))
}
