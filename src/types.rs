//! Type definitions for yt-hoard
//!
//! Source of truth for all data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ============================================
// Media Types
// ============================================

/// What a sync run fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_video_flag(video: bool) -> Self {
        if video { Self::Video } else { Self::Audio }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an enumerated playlist. Lives for a single run only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    /// Opaque, stable identifier (dedup key)
    pub id: String,
    pub title: Option<String>,
}

impl PlaylistItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
        }
    }

    /// Title when known, identifier otherwise
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

// ============================================
// Config Types
// ============================================

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio output folder (empty = <Desktop>/YouTube Audio)
    pub audio_dir: String,
    /// Video output folder (empty = <Desktop>/YouTube Videos)
    pub video_dir: String,
    /// yt-dlp location used when it is not on PATH
    pub ytdlp_path: String,
    /// ffmpeg location used when it is not on PATH
    pub ffmpeg_path: String,
    /// Audio container passed to --audio-format
    pub audio_format: String,
    /// Passed to --audio-quality (0 = best)
    pub audio_quality: String,
    /// yt-dlp format selector for video mode
    pub video_format: String,
    /// Passed to --limit-rate in video mode (empty = unlimited)
    pub rate_limit: String,
    /// Pause between audio items, in seconds
    pub audio_delay_secs: u64,
    /// Pause between video items, in seconds
    pub video_delay_secs: u64,
    /// Embed thumbnails as cover art in audio files
    pub embed_thumbnails: bool,
    /// Editor command (default: "nvim")
    pub editor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio_dir: String::new(),
            video_dir: String::new(),
            ytdlp_path: String::new(),
            ffmpeg_path: String::new(),
            audio_format: "mp3".into(),
            audio_quality: "0".into(),
            video_format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into(),
            rate_limit: "2M".into(),
            audio_delay_secs: 2,
            video_delay_secs: 3,
            embed_thumbnails: true,
            editor: "nvim".into(),
        }
    }
}

impl Config {
    pub fn delay_for(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Audio => Duration::from_secs(self.audio_delay_secs),
            MediaKind::Video => Duration::from_secs(self.video_delay_secs),
        }
    }
}

// ============================================
// Sync Types
// ============================================

/// Parameters of one sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub kind: MediaKind,
    pub output_dir: PathBuf,
    /// Pause between consecutive items (none after the last one)
    pub delay: Duration,
    /// Only honoured in audio mode
    pub embed_cover: bool,
    /// Extension of the audio files yt-dlp writes (`ogg` for vorbis)
    pub audio_ext: String,
}

/// Terminal state of a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Skipped,
    Succeeded,
    Failed,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub covers_embedded: usize,
    pub covers_failed: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Succeeded => self.downloaded += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    /// True when the run had nothing new to fetch
    pub fn is_noop(&self) -> bool {
        self.downloaded == 0 && self.failed == 0
    }
}

// ============================================
// Cover Types
// ============================================

/// ffmpeg argument strategy for attaching a cover image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStrategy {
    /// Stream-copy the image as an attached picture
    Primary,
    /// Re-encode the image to MJPEG first
    Fallback,
}

impl EmbedStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of a cover embedding attempt for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOutcome {
    Embedded(EmbedStrategy),
    /// Both strategies failed; audio and thumbnails are left untouched
    Failed,
    /// Audio or thumbnail could not be located
    Skipped,
}

// ============================================
// Worker Types
// ============================================

/// What the background worker should run
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub url: String,
    pub kind: MediaKind,
    /// Child program
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Ordered stream emitted by a worker. Exactly one of `Finished` or `Error`
/// terminates the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Output(String),
    Finished { success: bool, message: String },
    Error(String),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Output(_))
    }
}
