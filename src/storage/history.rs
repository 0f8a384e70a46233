//! Download history management
//!
//! One identifier per line, plain UTF-8, no header. The file is read in full
//! once per run and only ever appended to afterwards.

use crate::error::Result;
use crate::utils::paths::ensure_dir;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// History manager
pub struct HistoryRecord {
    path: PathBuf,
    ids: HashSet<String>,
    /// Whether the file currently ends mid-line
    needs_newline: bool,
}

impl HistoryRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: HashSet::new(),
            needs_newline: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load history from file, creating an empty one on first run
    pub async fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                ensure_dir(parent).await?;
            }
            fs::write(&self.path, "").await?;
            self.ids.clear();
            self.needs_newline = false;
            return Ok(());
        }

        let content = fs::read_to_string(&self.path).await?;
        self.ids = parse_history(&content);
        self.needs_newline = !content.is_empty() && !content.ends_with('\n');
        Ok(())
    }

    /// Membership test; no check that the downloaded file still exists
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Append an identifier to the file immediately
    pub async fn append(&mut self, id: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let line = if self.needs_newline {
            format!("\n{}\n", id)
        } else {
            format!("{}\n", id)
        };
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        self.needs_newline = false;
        self.ids.insert(id.to_string());
        Ok(())
    }
}

/// Parse history file content into a set of identifiers
pub fn parse_history(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
