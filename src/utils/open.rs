//! Open a folder in the platform file browser

use crate::error::{HoardError, Result};
use std::path::Path;
use tokio::process::Command;

fn opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Show `path` in the file browser
pub async fn open_folder(path: &Path) -> Result<()> {
    let program = opener();
    let status = Command::new(program)
        .arg(path)
        .status()
        .await
        .map_err(|e| HoardError::Spawn(format!("Failed to start {}: {}", program, e)))?;

    // explorer.exe reports 1 even when the window opens
    if !status.success() && !cfg!(target_os = "windows") {
        return Err(HoardError::ToolFailed {
            tool: program.into(),
            code: status.code(),
        });
    }

    Ok(())
}
