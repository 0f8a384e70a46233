//! yt-hoard - download YouTube playlists once
//!
//! Lists a video or playlist with yt-dlp, skips everything recorded in the
//! history file and downloads the rest, optionally embedding cover art.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use yt_hoard::core::backend::CoverEmbedder;
use yt_hoard::core::ffmpeg::Ffmpeg;
use yt_hoard::core::worker::WorkerSlot;
use yt_hoard::core::ytdlp::{YtDlp, YtDlpSettings, audio_extension};
use yt_hoard::core::{sync, tools};
use yt_hoard::error::HoardError;
use yt_hoard::storage::config;
use yt_hoard::storage::history::HistoryRecord;
use yt_hoard::types::{MediaKind, SyncOptions, WorkerEvent, WorkerRequest};
use yt_hoard::ui::console;
use yt_hoard::utils::open::open_folder;
use yt_hoard::utils::paths::{self, ensure_dir, get_config_path};

/// Download YouTube playlists once. Keeps a history so nothing is fetched twice.
#[derive(Parser, Debug)]
#[command(name = "yt-hoard")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download every item at a URL that is not in the history yet
    Sync(SyncArgs),

    /// Run a sync in a background process and relay its output
    Relay {
        /// Video or playlist URL (prompted for when omitted)
        url: Option<String>,

        /// Download video (audio-only by default)
        #[arg(long)]
        video: bool,
    },

    /// Open the download folder
    Open {
        /// Open the video folder instead of the audio one
        #[arg(long)]
        video: bool,
    },

    /// Show the download history
    History {
        /// Video history instead of audio
        #[arg(long)]
        video: bool,

        /// Print every recorded identifier
        #[arg(short, long)]
        list: bool,
    },

    /// Show or edit the configuration file
    Config {
        /// Open the configuration file in the editor
        #[arg(short, long)]
        edit: bool,
    },
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// Video or playlist URL (read from the prompt or stdin when omitted)
    url: Option<String>,

    /// Download video (audio-only by default)
    #[arg(long)]
    video: bool,

    /// Output folder
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// History file (defaults to one inside the output folder)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Seconds to wait between items
    #[arg(short, long)]
    delay: Option<u64>,

    /// Do not embed thumbnails as cover art
    #[arg(long)]
    no_cover: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Sync(args) => run_sync(args).await,
        Command::Relay { url, video } => run_relay(url, MediaKind::from_video_flag(video)).await,
        Command::Open { video } => run_open(MediaKind::from_video_flag(video)).await,
        Command::History { video, list } => {
            run_history(MediaKind::from_video_flag(video), list).await
        }
        Command::Config { edit } => run_config(edit).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            exit_code_for(&e)
        }
    }
}

/// Library errors carry their own status; anything else is a plain failure
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    error
        .downcast_ref::<HoardError>()
        .map(|e| ExitCode::from(e.code().exit_status()))
        .unwrap_or(ExitCode::FAILURE)
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<ExitCode> {
    let cfg = config::load_config().await?;
    let kind = MediaKind::from_video_flag(args.video);

    // Tools are resolved before any work starts
    let ytdlp_path = tools::resolve_ytdlp(&cfg.ytdlp_path)?;
    let embed_cover = kind == MediaKind::Audio && cfg.embed_thumbnails && !args.no_cover;
    let ffmpeg = if embed_cover {
        Some(Ffmpeg::new(tools::resolve_ffmpeg(&cfg.ffmpeg_path)?))
    } else {
        None
    };

    let audio_ext = audio_extension(&cfg.audio_format).ok_or_else(|| {
        HoardError::InvalidConfig(format!("unsupported audio_format {:?}", cfg.audio_format))
    })?;

    let output_dir = args.output.unwrap_or_else(|| paths::output_dir(&cfg, kind));
    ensure_dir(&output_dir).await?;
    console::banner(kind, &output_dir);

    let url = match args.url {
        Some(url) => url,
        None => console::read_url(kind)?,
    };
    if url.trim().is_empty() {
        println!("{}", "No URL provided. Exiting.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let history_path = args
        .history
        .unwrap_or_else(|| paths::history_path(&output_dir, kind));
    let mut history = HistoryRecord::new(history_path);
    history.load().await?;

    let options = SyncOptions {
        kind,
        delay: args
            .delay
            .map(Duration::from_secs)
            .unwrap_or_else(|| cfg.delay_for(kind)),
        embed_cover,
        audio_ext: audio_ext.to_string(),
        output_dir,
    };
    let source = YtDlp::new(ytdlp_path, YtDlpSettings::from_config(&cfg, embed_cover));
    let embedder = ffmpeg.as_ref().map(|f| f as &dyn CoverEmbedder);

    let summary = sync::sync(&url, &source, embedder, &mut history, &options).await?;
    console::summary(&summary);

    Ok(ExitCode::SUCCESS)
}

async fn run_relay(url: Option<String>, kind: MediaKind) -> anyhow::Result<ExitCode> {
    let url = match url {
        Some(url) => url,
        None => console::read_url(kind)?,
    };
    if url.trim().is_empty() {
        println!("{}", "No URL provided. Exiting.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let mut args = vec!["sync".to_string()];
    if kind == MediaKind::Video {
        args.push("--video".into());
    }

    let request = WorkerRequest {
        url: url.trim().to_string(),
        kind,
        program: std::env::current_exe()?,
        args,
    };

    let slot = WorkerSlot::new();
    let handle = slot.start(request)?;
    let terminal = handle.run_to_end(console::worker_event).await;

    Ok(match terminal {
        WorkerEvent::Finished { success: true, .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_open(kind: MediaKind) -> anyhow::Result<ExitCode> {
    let cfg = config::load_config().await?;
    let dir = paths::output_dir(&cfg, kind);
    ensure_dir(&dir).await?;

    println!("{} {}", "Opening:".dimmed(), dir.display());
    open_folder(&dir).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_history(kind: MediaKind, list: bool) -> anyhow::Result<ExitCode> {
    let cfg = config::load_config().await?;
    let path = paths::history_path(&paths::output_dir(&cfg, kind), kind);

    println!("{} {}", "History file:".dimmed(), path.display());

    // read-only: never create the folder or the file here
    if !path.exists() {
        println!("{}", "No history yet.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let mut history = HistoryRecord::new(&path);
    history.load().await?;
    if history.is_empty() {
        println!("{}", "No history yet.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", history.len().to_string().cyan(), "downloaded");
    if list {
        for id in history.ids() {
            println!("{}", id);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_config(edit: bool) -> anyhow::Result<ExitCode> {
    let cfg = config::load_config().await?;

    if edit {
        config::edit_config(&cfg.editor).await?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Config file:".dimmed(), get_config_path().display());
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(ExitCode::SUCCESS)
}
