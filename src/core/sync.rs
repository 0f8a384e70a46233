//! Playlist sync: fetch every item of a URL exactly once
//!
//! Identifiers already in the history file are skipped. Each successful item
//! is appended to the history straight away, so an interrupted run only loses
//! the item that was in flight.

use crate::core::backend::{CoverEmbedder, MediaSource};
use crate::core::cover;
use crate::error::{HoardError, Result};
use crate::storage::history::HistoryRecord;
use crate::types::{CoverOutcome, ItemOutcome, MediaKind, PlaylistItem, SyncOptions, SyncSummary};
use crate::ui::console;
use std::collections::HashSet;
use tokio::time::sleep;

/// Items left to fetch after filtering against the history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// In enumeration order
    pub pending: Vec<PlaylistItem>,
    pub skipped: usize,
}

/// Compute `enumerated - history`, preserving order.
///
/// Repeated identifiers in the listing are kept once.
pub fn plan(enumerated: Vec<PlaylistItem>, history: &HistoryRecord) -> SyncPlan {
    let mut seen = HashSet::new();
    let mut result = SyncPlan::default();

    for item in enumerated {
        if !seen.insert(item.id.clone()) {
            continue;
        }
        if history.contains(&item.id) {
            result.skipped += 1;
        } else {
            result.pending.push(item);
        }
    }

    result
}

/// Run one sync of `url` into `options.output_dir`
pub async fn sync(
    url: &str,
    source: &dyn MediaSource,
    embedder: Option<&dyn CoverEmbedder>,
    history: &mut HistoryRecord,
    options: &SyncOptions,
) -> Result<SyncSummary> {
    let url = url.trim();
    if url.is_empty() {
        return Err(HoardError::EmptyUrl);
    }

    let spinner = console::spinner(&format!("Checking for {} to download...", options.kind));
    let enumerated = source.enumerate(url).await;
    spinner.finish_and_clear();

    let SyncPlan { pending, skipped } = plan(enumerated, history);
    let mut summary = SyncSummary {
        skipped,
        ..SyncSummary::default()
    };

    if pending.is_empty() {
        console::nothing_to_do(options.kind, skipped);
        return Ok(summary);
    }

    console::found_new(options.kind, pending.len(), skipped);

    let embedder = match options.kind {
        MediaKind::Audio if options.embed_cover => embedder,
        _ => None,
    };

    let total = pending.len();
    for (index, item) in pending.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            sleep(options.delay).await;
        }

        console::item_start(index + 1, total, item);
        let outcome = fetch_item(source, embedder, history, options, item, &mut summary).await;
        summary.record(outcome);
    }

    Ok(summary)
}

async fn fetch_item(
    source: &dyn MediaSource,
    embedder: Option<&dyn CoverEmbedder>,
    history: &mut HistoryRecord,
    options: &SyncOptions,
    item: &PlaylistItem,
    summary: &mut SyncSummary,
) -> ItemOutcome {
    if let Err(e) = source.fetch(item, options.kind, &options.output_dir).await {
        tracing::warn!("download of {} failed: {}", item.id, e);
        console::item_failed(item, &e);
        return ItemOutcome::Failed;
    }

    if let Err(e) = history.append(&item.id).await {
        tracing::error!(
            "downloaded {} but could not record it in {}: {}",
            item.id,
            history.path().display(),
            e
        );
    }

    if let Some(embedder) = embedder {
        match cover::embed_for_item(embedder, &options.output_dir, &item.id, &options.audio_ext)
            .await
        {
            CoverOutcome::Embedded(_) => summary.covers_embedded += 1,
            CoverOutcome::Failed => summary.covers_failed += 1,
            CoverOutcome::Skipped => {}
        }
    }

    console::item_done(item);
    ItemOutcome::Succeeded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<PlaylistItem> {
        ids.iter().map(|id| PlaylistItem::new(*id)).collect()
    }

    async fn history_with(ids: &[&str]) -> (tempfile::TempDir, HistoryRecord) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let content: String = ids.iter().map(|id| format!("{}\n", id)).collect();
        std::fs::write(&path, content).unwrap();
        let mut history = HistoryRecord::new(path);
        history.load().await.unwrap();
        (dir, history)
    }

    #[tokio::test]
    async fn plan_is_set_difference_in_order() {
        let (_dir, history) = history_with(&["B"]).await;
        let result = plan(items(&["A", "B", "C"]), &history);

        let ids: Vec<&str> = result.pending.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(result.skipped, 1);
    }

    #[tokio::test]
    async fn plan_drops_repeated_ids() {
        let (_dir, history) = history_with(&[]).await;
        let result = plan(items(&["A", "B", "A"]), &history);
        assert_eq!(result.pending, items(&["A", "B"]));
        assert_eq!(result.skipped, 0);
    }

    #[tokio::test]
    async fn plan_of_empty_listing_is_empty() {
        let (_dir, history) = history_with(&["A"]).await;
        assert_eq!(plan(Vec::new(), &history), SyncPlan::default());
    }
}
