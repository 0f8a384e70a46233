//! External tool discovery

use crate::error::{HoardError, Result};
use std::path::{Path, PathBuf};

/// Resolve `tool` on the system search path, falling back to `override_path`.
///
/// `config_key` names the setting that holds the override and is only used in
/// the error message.
pub fn resolve_tool(tool: &str, override_path: &str, config_key: &str) -> Result<PathBuf> {
    if let Ok(path) = which::which(tool) {
        tracing::debug!("{} found on PATH: {}", tool, path.display());
        return Ok(path);
    }

    if !override_path.is_empty() {
        let candidate = Path::new(override_path);
        if candidate.is_file() {
            tracing::debug!("{} found at configured path: {}", tool, candidate.display());
            return Ok(candidate.to_path_buf());
        }
        tracing::warn!("configured {} path does not exist: {}", tool, override_path);
    }

    Err(HoardError::ToolNotFound {
        tool: tool.into(),
        key: config_key.into(),
    })
}

/// Resolve yt-dlp
pub fn resolve_ytdlp(override_path: &str) -> Result<PathBuf> {
    resolve_tool("yt-dlp", override_path, "ytdlp_path")
}

/// Resolve ffmpeg
pub fn resolve_ffmpeg(override_path: &str) -> Result<PathBuf> {
    resolve_tool("ffmpeg", override_path, "ffmpeg_path")
}
