//! ffmpeg integration: cover art embedding

use crate::core::backend::CoverEmbedder;
use crate::error::{HoardError, Result};
use crate::types::EmbedStrategy;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Arguments that attach `image` to `audio` and write `output`
pub fn build_embed_args(
    strategy: EmbedStrategy,
    audio: &Path,
    image: &Path,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        audio.to_string_lossy().into_owned(),
        "-i".into(),
        image.to_string_lossy().into_owned(),
        "-map".into(),
        "0:a".into(),
        "-map".into(),
        "1:0".into(),
    ];

    match strategy {
        EmbedStrategy::Primary => {
            args.extend(["-c".into(), "copy".into()]);
        }
        EmbedStrategy::Fallback => {
            args.extend(["-c:a".into(), "copy".into(), "-c:v".into(), "mjpeg".into()]);
        }
    }

    args.extend([
        "-id3v2_version".into(),
        "3".into(),
        "-metadata:s:v".into(),
        "title=Album cover".into(),
        "-metadata:s:v".into(),
        "comment=Cover (front)".into(),
        "-disposition:v".into(),
        "attached_pic".into(),
        output.to_string_lossy().into_owned(),
    ]);

    args
}

/// ffmpeg executable
pub struct Ffmpeg {
    path: PathBuf,
}

impl Ffmpeg {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CoverEmbedder for Ffmpeg {
    async fn embed(
        &self,
        strategy: EmbedStrategy,
        audio: &Path,
        image: &Path,
        output: &Path,
    ) -> Result<()> {
        let output_result = Command::new(&self.path)
            .args(build_embed_args(strategy, audio, image, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| HoardError::Spawn(format!("Failed to start ffmpeg: {}", e)))?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr);
            tracing::debug!("ffmpeg {} strategy stderr: {}", strategy.as_str(), stderr.trim());
            return Err(HoardError::ToolFailed {
                tool: "ffmpeg".into(),
                code: output_result.status.code(),
            });
        }

        Ok(())
    }
}
