//! Console output and prompts

use crate::error::HoardError;
use crate::types::{MediaKind, PlaylistItem, SyncSummary, WorkerEvent};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::time::Duration;

/// Spinner shown while yt-dlp lists a playlist
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn noun(kind: MediaKind, count: usize) -> &'static str {
    match (kind, count) {
        (MediaKind::Audio, 1) => "audio track",
        (MediaKind::Audio, _) => "audio tracks",
        (MediaKind::Video, 1) => "video",
        (MediaKind::Video, _) => "videos",
    }
}

/// Header printed before a run
pub fn banner(kind: MediaKind, output_dir: &Path) {
    let title = match kind {
        MediaKind::Audio => "YouTube Audio Downloader",
        MediaKind::Video => "YouTube Video Downloader",
    };
    println!("{}", title.bold());
    println!("{}", "=".repeat(50).dimmed());
    println!("{} {}", "Saving to:".dimmed(), output_dir.display());
}

pub fn nothing_to_do(kind: MediaKind, skipped: usize) {
    if skipped == 0 {
        println!("{}", format!("No {} found at that URL.", noun(kind, 0)).yellow());
    } else {
        println!(
            "{}",
            format!("Nothing to do: all {} {} already downloaded.", skipped, noun(kind, skipped))
                .green()
        );
    }
}

pub fn found_new(kind: MediaKind, count: usize, skipped: usize) {
    println!(
        "Found {} new {} to download {}",
        count.to_string().cyan(),
        noun(kind, count),
        format!("({} already downloaded)", skipped).dimmed()
    );
}

pub fn item_start(index: usize, total: usize, item: &PlaylistItem) {
    println!(
        "{} {} {}",
        format!("[{}/{}]", index, total).dimmed(),
        "Downloading".cyan(),
        item.label()
    );
}

pub fn item_done(item: &PlaylistItem) {
    println!("{} {}", "✓".green(), item.id);
}

pub fn item_failed(item: &PlaylistItem, error: &HoardError) {
    eprintln!("{} {} {}", "✗".red(), item.id, error.to_string().dimmed());
}

/// End-of-run counts
pub fn summary(summary: &SyncSummary) {
    println!();
    println!(
        "{} {}  {} {}  {} {}",
        "Downloaded:".green(),
        summary.downloaded,
        "Skipped:".dimmed(),
        summary.skipped,
        "Failed:".red(),
        summary.failed
    );
    if summary.covers_embedded + summary.covers_failed > 0 {
        println!(
            "{} {}  {} {}",
            "Covers embedded:".green(),
            summary.covers_embedded,
            "Covers missing:".yellow(),
            summary.covers_failed
        );
    }
}

/// Print one event relayed from a background worker
pub fn worker_event(event: &WorkerEvent) {
    match event {
        WorkerEvent::Output(line) => println!("{}", line),
        WorkerEvent::Finished { success: true, message } => println!("{}", message.green()),
        WorkerEvent::Finished { success: false, message } => eprintln!("{}", message.red()),
        WorkerEvent::Error(message) => eprintln!("{} {}", "Error:".red(), message),
    }
}

/// Ask for a URL. Prompts on a terminal; otherwise reads one line of stdin.
pub fn read_url(kind: MediaKind) -> anyhow::Result<String> {
    if std::io::stdin().is_terminal() {
        let input: String = dialoguer::Input::new()
            .with_prompt(format!("Enter YouTube URL ({} or playlist)", kind))
            .allow_empty(true)
            .interact_text()?;
        return Ok(input.trim().to_string());
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
