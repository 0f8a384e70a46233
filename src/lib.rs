//! yt-hoard library
//!
//! Download-once playlist sync on top of yt-dlp and ffmpeg.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
