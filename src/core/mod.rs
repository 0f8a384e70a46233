//! Core modules: external tools, cover art, sync driver, background worker

pub mod backend;
pub mod cover;
pub mod ffmpeg;
pub mod sync;
pub mod tools;
pub mod worker;
pub mod ytdlp;
