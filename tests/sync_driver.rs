use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

use yt_hoard::core::backend::{CoverEmbedder, MediaSource};
use yt_hoard::core::sync::sync;
use yt_hoard::error::{HoardError, Result};
use yt_hoard::storage::history::HistoryRecord;
use yt_hoard::types::{EmbedStrategy, MediaKind, PlaylistItem, SyncOptions};

const URL: &str = "https://www.youtube.com/playlist?list=PLtest";

/// Pretends to be yt-dlp: lists fixed items and writes fake artifacts
struct FakeSource {
    items: Vec<PlaylistItem>,
    failing: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeSource {
    fn new(ids: &[&str]) -> Self {
        Self {
            items: ids
                .iter()
                .map(|id| PlaylistItem::with_title(*id, format!("Track {}", id)))
                .collect(),
            failing: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn enumerate(&self, _url: &str) -> Vec<PlaylistItem> {
        self.items.clone()
    }

    async fn fetch(&self, item: &PlaylistItem, kind: MediaKind, output_dir: &Path) -> Result<()> {
        self.fetched.lock().unwrap().push(item.id.clone());
        if self.failing.contains(&item.id) {
            return Err(HoardError::ToolFailed {
                tool: "yt-dlp".into(),
                code: Some(1),
            });
        }

        let stem = format!("{} [{}]", item.label(), item.id);
        match kind {
            MediaKind::Audio => {
                std::fs::write(output_dir.join(format!("{}.mp3", stem)), "audio")?;
                std::fs::write(output_dir.join(format!("{}.jpg", stem)), "jpg")?;
            }
            MediaKind::Video => {
                std::fs::write(output_dir.join(format!("{}.mp4", stem)), "video")?;
            }
        }
        Ok(())
    }
}

/// Pretends to be ffmpeg
struct FakeEmbedder {
    succeeds: Vec<EmbedStrategy>,
    calls: Mutex<usize>,
}

impl FakeEmbedder {
    fn new(succeeds: &[EmbedStrategy]) -> Self {
        Self {
            succeeds: succeeds.to_vec(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl CoverEmbedder for FakeEmbedder {
    async fn embed(
        &self,
        strategy: EmbedStrategy,
        _audio: &Path,
        _image: &Path,
        output: &Path,
    ) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        if self.succeeds.contains(&strategy) {
            std::fs::write(output, format!("with-cover:{}", strategy.as_str()))?;
            Ok(())
        } else {
            Err(HoardError::ToolFailed {
                tool: "ffmpeg".into(),
                code: Some(1),
            })
        }
    }
}

struct Workspace {
    dir: TempDir,
    history_path: PathBuf,
}

impl Workspace {
    fn new(existing: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join(".audio_download_history.txt");
        if !existing.is_empty() {
            let content: String = existing.iter().map(|id| format!("{}\n", id)).collect();
            std::fs::write(&history_path, content).unwrap();
        }
        Self { dir, history_path }
    }

    fn options(&self, kind: MediaKind, embed_cover: bool) -> SyncOptions {
        SyncOptions {
            kind,
            output_dir: self.dir.path().to_path_buf(),
            delay: Duration::ZERO,
            embed_cover,
            audio_ext: "mp3".into(),
        }
    }

    async fn history(&self) -> HistoryRecord {
        let mut history = HistoryRecord::new(&self.history_path);
        history.load().await.unwrap();
        history
    }

    fn history_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.history_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[tokio::test]
async fn fetches_only_new_items_in_order() {
    let ws = Workspace::new(&["B"]);
    let source = FakeSource::new(&["A", "B", "C"]);
    let mut history = ws.history().await;

    let summary = sync(URL, &source, None, &mut history, &ws.options(MediaKind::Video, false))
        .await
        .unwrap();

    assert_eq!(source.fetched(), vec!["A", "C"]);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(ws.history_lines(), vec!["B", "A", "C"]);
}

#[tokio::test]
async fn second_run_downloads_nothing() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A", "B", "C"]);
    let options = ws.options(MediaKind::Video, false);

    let mut history = ws.history().await;
    let first = sync(URL, &source, None, &mut history, &options).await.unwrap();
    assert_eq!(first.downloaded, 3);

    let lines_after_first = ws.history_lines();

    let mut reloaded = ws.history().await;
    let second = sync(URL, &source, None, &mut reloaded, &options).await.unwrap();

    assert!(second.is_noop());
    assert_eq!(second.skipped, 3);
    assert_eq!(source.fetched().len(), 3);
    assert_eq!(ws.history_lines(), lines_after_first);
}

#[tokio::test]
async fn failed_items_are_not_recorded_and_do_not_stop_the_batch() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A", "B", "C"]).failing(&["B"]);
    let mut history = ws.history().await;

    let summary = sync(URL, &source, None, &mut history, &ws.options(MediaKind::Video, false))
        .await
        .unwrap();

    assert_eq!(source.fetched(), vec!["A", "B", "C"]);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(ws.history_lines(), vec!["A", "C"]);
    assert!(!history.contains("B"));

    // B is retried on the next run
    let retry = FakeSource::new(&["A", "B", "C"]);
    let mut reloaded = ws.history().await;
    let summary = sync(URL, &retry, None, &mut reloaded, &ws.options(MediaKind::Video, false))
        .await
        .unwrap();
    assert_eq!(retry.fetched(), vec!["B"]);
    assert_eq!(summary.downloaded, 1);
}

#[tokio::test]
async fn empty_listing_is_not_an_error() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&[]);
    let mut history = ws.history().await;

    let summary = sync(URL, &source, None, &mut history, &ws.options(MediaKind::Audio, false))
        .await
        .unwrap();

    assert!(summary.is_noop());
    assert_eq!(summary.skipped, 0);
    assert!(ws.history_lines().is_empty());
}

#[tokio::test]
async fn blank_url_is_rejected() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A"]);
    let mut history = ws.history().await;

    let result = sync("   ", &source, None, &mut history, &ws.options(MediaKind::Audio, false)).await;

    assert!(matches!(result, Err(HoardError::EmptyUrl)));
    assert!(source.fetched().is_empty());
}

#[tokio::test]
async fn recorded_item_is_skipped_even_if_its_file_is_gone() {
    let ws = Workspace::new(&["A"]);
    let source = FakeSource::new(&["A"]);
    let mut history = ws.history().await;

    assert!(!ws.path("Track A [A].mp4").exists());
    let summary = sync(URL, &source, None, &mut history, &ws.options(MediaKind::Video, false))
        .await
        .unwrap();

    assert!(source.fetched().is_empty());
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn fallback_cover_is_embedded_and_thumbnail_removed() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A"]);
    let embedder = FakeEmbedder::new(&[EmbedStrategy::Fallback]);
    let mut history = ws.history().await;

    let summary = sync(
        URL,
        &source,
        Some(&embedder),
        &mut history,
        &ws.options(MediaKind::Audio, true),
    )
    .await
    .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.covers_embedded, 1);
    assert_eq!(
        std::fs::read_to_string(ws.path("Track A [A].mp3")).unwrap(),
        "with-cover:fallback"
    );
    assert!(!ws.path("Track A [A].jpg").exists());
    assert_eq!(ws.history_lines(), vec!["A"]);
}

#[tokio::test]
async fn cover_failure_still_counts_as_downloaded() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A"]);
    let embedder = FakeEmbedder::new(&[]);
    let mut history = ws.history().await;

    let summary = sync(
        URL,
        &source,
        Some(&embedder),
        &mut history,
        &ws.options(MediaKind::Audio, true),
    )
    .await
    .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.covers_failed, 1);
    assert_eq!(std::fs::read_to_string(ws.path("Track A [A].mp3")).unwrap(), "audio");
    assert!(ws.path("Track A [A].jpg").exists());
    assert_eq!(ws.history_lines(), vec!["A"]);
}

#[tokio::test]
async fn video_runs_never_embed_covers() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A"]);
    let embedder = FakeEmbedder::new(&[EmbedStrategy::Primary]);
    let mut history = ws.history().await;

    sync(
        URL,
        &source,
        Some(&embedder),
        &mut history,
        &ws.options(MediaKind::Video, true),
    )
    .await
    .unwrap();

    assert_eq!(*embedder.calls.lock().unwrap(), 0);
}

/// Records the (virtual) time each fetch starts
struct TimedSource {
    inner: FakeSource,
    started: Mutex<Vec<Instant>>,
}

#[async_trait]
impl MediaSource for TimedSource {
    async fn enumerate(&self, url: &str) -> Vec<PlaylistItem> {
        self.inner.enumerate(url).await
    }

    async fn fetch(&self, item: &PlaylistItem, kind: MediaKind, output_dir: &Path) -> Result<()> {
        self.started.lock().unwrap().push(Instant::now());
        self.inner.fetch(item, kind, output_dir).await
    }
}

#[tokio::test(start_paused = true)]
async fn delay_only_between_items() {
    let ws = Workspace::new(&[]);
    let source = TimedSource {
        inner: FakeSource::new(&["A", "B", "C"]),
        started: Mutex::new(Vec::new()),
    };
    let delay = Duration::from_secs(5);
    let options = SyncOptions {
        delay,
        ..ws.options(MediaKind::Video, false)
    };
    let mut history = ws.history().await;

    let begin = Instant::now();
    sync(URL, &source, None, &mut history, &options).await.unwrap();
    let end = Instant::now();

    let started = source.started.lock().unwrap().clone();
    assert_eq!(started.len(), 3);
    assert!(started[0] - begin < delay, "no pause before the first item");
    for pair in started.windows(2) {
        assert!(pair[1] - pair[0] >= delay);
    }
    assert!(end - started[2] < delay, "no pause after the last item");
}

#[tokio::test]
async fn history_write_failure_keeps_the_item_downloaded() {
    let ws = Workspace::new(&[]);
    let source = FakeSource::new(&["A"]);
    let mut history = ws.history().await;

    // a directory where the history file should be makes every append fail
    std::fs::remove_file(&ws.history_path).unwrap();
    std::fs::create_dir(&ws.history_path).unwrap();

    let summary = sync(URL, &source, None, &mut history, &ws.options(MediaKind::Video, false))
        .await
        .unwrap();

    assert_eq!(source.fetched(), vec!["A"]);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);
    assert!(ws.path("Track A [A].mp4").exists());
}
