//! Cover art: find what yt-dlp left behind and embed it

use crate::core::backend::CoverEmbedder;
use crate::error::Result;
use crate::types::{CoverOutcome, EmbedStrategy};
use std::path::{Path, PathBuf};
use tokio::fs;

const THUMBNAIL_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Files belonging to one downloaded item
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub audio: Option<PathBuf>,
    /// Sorted, preferred image first
    pub thumbnails: Vec<PathBuf>,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Temporary output next to the audio file: `song.mp3` -> `song.cover.mp3`
pub fn temp_output_path(audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = extension_of(audio);
    audio.with_file_name(format!("{}.cover.{}", stem, ext))
}

/// Scan `dir` for the audio file and thumbnails tagged `[id]`.
/// `audio_ext` is the file extension, not the yt-dlp format name.
pub async fn locate_artifacts(dir: &Path, id: &str, audio_ext: &str) -> Result<Artifacts> {
    let tag = format!("[{}]", id);
    let audio_ext = audio_ext.to_ascii_lowercase();
    let temp_suffix = format!(".cover.{}", audio_ext);

    let mut artifacts = Artifacts::default();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(&tag) || name.ends_with(&temp_suffix) {
            continue;
        }

        let ext = extension_of(&path);
        if ext == audio_ext {
            artifacts.audio = Some(path);
        } else if THUMBNAIL_EXTENSIONS.contains(&ext.as_str()) {
            artifacts.thumbnails.push(path);
        }
    }

    // jpg first, then by name
    artifacts.thumbnails.sort_by_key(|p| {
        let ext = extension_of(p);
        (!matches!(ext.as_str(), "jpg" | "jpeg"), p.clone())
    });

    Ok(artifacts)
}

/// Embed the first thumbnail into `audio`, trying the primary then the
/// fallback strategy. Thumbnails are removed only after an embed has been
/// written back over the audio file.
pub async fn embed_cover<E: CoverEmbedder + ?Sized>(
    embedder: &E,
    audio: &Path,
    thumbnails: &[PathBuf],
) -> CoverOutcome {
    let Some(image) = thumbnails.first() else {
        return CoverOutcome::Skipped;
    };

    let temp = temp_output_path(audio);

    for strategy in [EmbedStrategy::Primary, EmbedStrategy::Fallback] {
        match embedder.embed(strategy, audio, image, &temp).await {
            Ok(()) => {
                if let Err(e) = fs::rename(&temp, audio).await {
                    tracing::warn!(
                        "could not replace {} with embedded copy: {}",
                        audio.display(),
                        e
                    );
                    remove_quietly(&temp).await;
                    return CoverOutcome::Failed;
                }
                remove_thumbnails(thumbnails).await;
                return CoverOutcome::Embedded(strategy);
            }
            Err(e) => {
                tracing::warn!(
                    "{} cover strategy failed for {}: {}",
                    strategy.as_str(),
                    audio.display(),
                    e
                );
                remove_quietly(&temp).await;
            }
        }
    }

    CoverOutcome::Failed
}

/// Locate artifacts for `id` and embed; never fails the item
pub async fn embed_for_item<E: CoverEmbedder + ?Sized>(
    embedder: &E,
    dir: &Path,
    id: &str,
    audio_ext: &str,
) -> CoverOutcome {
    let artifacts = match locate_artifacts(dir, id, audio_ext).await {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("could not scan {} for {}: {}", dir.display(), id, e);
            return CoverOutcome::Skipped;
        }
    };

    let Some(audio) = artifacts.audio else {
        tracing::warn!("no .{} file found for {}; cover skipped", audio_ext, id);
        return CoverOutcome::Skipped;
    };

    if artifacts.thumbnails.is_empty() {
        tracing::warn!("no thumbnail found for {}; cover skipped", id);
        return CoverOutcome::Skipped;
    }

    embed_cover(embedder, &audio, &artifacts.thumbnails).await
}

async fn remove_thumbnails(thumbnails: &[PathBuf]) {
    for thumb in thumbnails {
        if let Err(e) = fs::remove_file(thumb).await {
            tracing::warn!("could not delete thumbnail {}: {}", thumb.display(), e);
        }
    }
}

async fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!("could not delete {}: {}", path.display(), e);
        }
    }
}
