//! Path utilities for yt-hoard
//!
//! Respects XDG Base Directory Specification for the config file. Downloads
//! land on the Desktop unless the config says otherwise.

use crate::error::Result;
use crate::types::{Config, MediaKind};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_NAME: &str = "yt-hoard";

/// Get config directory path
/// Respects XDG_CONFIG_HOME, defaults to ~/.config/yt-hoard
pub fn get_config_dir() -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| home_dir().join(".config"));

    base.join(APP_NAME)
}

/// Get config file path
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Desktop folder, or ~/Desktop when the platform does not report one
pub fn get_desktop_dir() -> PathBuf {
    dirs::desktop_dir().unwrap_or_else(|| home_dir().join("Desktop"))
}

/// Folder name used under the Desktop for each kind
fn default_folder_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "YouTube Audio",
        MediaKind::Video => "YouTube Videos",
    }
}

/// Output folder for a kind, honouring the config override
pub fn output_dir(config: &Config, kind: MediaKind) -> PathBuf {
    let configured = match kind {
        MediaKind::Audio => &config.audio_dir,
        MediaKind::Video => &config.video_dir,
    };

    if configured.is_empty() {
        get_desktop_dir().join(default_folder_name(kind))
    } else {
        PathBuf::from(configured)
    }
}

/// History file name inside the output folder
pub fn history_file_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => ".audio_download_history.txt",
        MediaKind::Video => ".download_history.txt",
    }
}

/// History file for an output folder
pub fn history_path(output_dir: &Path, kind: MediaKind) -> PathBuf {
    output_dir.join(history_file_name(kind))
}

/// Ensure a directory exists
pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}
