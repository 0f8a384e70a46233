//! Configuration management

use crate::core::ytdlp::audio_extension;
use crate::error::{HoardError, Result};
use crate::types::Config;
use crate::utils::paths::{ensure_dir, get_config_path};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

/// Load configuration from the default location
pub async fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()).await
}

/// Load configuration from file; missing fields take their defaults
pub async fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_json::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if audio_extension(&config.audio_format).is_none() {
        return Err(HoardError::InvalidConfig(format!(
            "audio_format {:?} is not supported (use mp3, aac, m4a, alac, opus, vorbis, flac or wav)",
            config.audio_format
        )));
    }
    if config.video_format.trim().is_empty() {
        return Err(HoardError::InvalidConfig("video_format must not be empty".into()));
    }
    Ok(())
}

/// Save configuration to the default location
pub async fn save_config(config: &Config) -> Result<()> {
    save_config_to(&get_config_path(), config).await
}

/// Save configuration to file
pub async fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = get_config_path();

    // Ensure config file exists
    if !config_path.exists() {
        save_config(&Config::default()).await?;
    }

    let status = Command::new(editor)
        .arg(&config_path)
        .status()
        .await
        .map_err(|e| HoardError::Spawn(format!("Failed to start {}: {}", editor, e)))?;

    if !status.success() {
        return Err(HoardError::ToolFailed {
            tool: editor.into(),
            code: status.code(),
        });
    }

    Ok(())
}
