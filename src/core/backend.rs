//! Seams between the sync driver and the external tools

use crate::error::Result;
use crate::types::{EmbedStrategy, MediaKind, PlaylistItem};
use async_trait::async_trait;
use std::path::Path;

/// Something that can list and fetch the items behind a URL
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Metadata-only listing. Failures degrade to an empty list.
    async fn enumerate(&self, url: &str) -> Vec<PlaylistItem>;

    /// Fetch one item into `output_dir`. `Ok` only on exit status zero.
    async fn fetch(&self, item: &PlaylistItem, kind: MediaKind, output_dir: &Path) -> Result<()>;
}

/// Something that can attach a still image to an audio file
#[async_trait]
pub trait CoverEmbedder: Send + Sync {
    /// Write `audio` + `image` into `output` using `strategy`
    async fn embed(
        &self,
        strategy: EmbedStrategy,
        audio: &Path,
        image: &Path,
        output: &Path,
    ) -> Result<()>;
}
