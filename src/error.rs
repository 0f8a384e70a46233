//! Error types for yt-hoard

use thiserror::Error;

/// Coarse classification of failures; decides the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Dependency errors
    MissingTool,

    // User errors
    EmptyUrl,
    InvalidConfig,

    // Process errors
    SpawnError,
    ToolFailed,
    WorkerBusy,

    // System errors
    FileError,
}

/// Main error type for yt-hoard
#[derive(Error, Debug)]
pub enum HoardError {
    #[error("{tool} not found. Install it (e.g. `pip install {tool}`) or set `{key}` in the config file")]
    ToolNotFound { tool: String, key: String },

    #[error("No URL provided")]
    EmptyUrl,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("{tool} exited with code: {code:?}")]
    ToolFailed { tool: String, code: Option<i32> },

    #[error("A download is already running")]
    WorkerBusy,

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode {
    /// Exit status for a run that stopped with this kind of error
    pub fn exit_status(self) -> u8 {
        match self {
            // shell convention for "command not found"
            Self::MissingTool => 127,
            // sysexits EX_USAGE, EX_CONFIG, EX_TEMPFAIL
            Self::EmptyUrl => 64,
            Self::InvalidConfig => 78,
            Self::WorkerBusy => 75,
            Self::SpawnError | Self::ToolFailed | Self::FileError => 1,
        }
    }
}

impl HoardError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ToolNotFound { .. } => ErrorCode::MissingTool,
            Self::EmptyUrl => ErrorCode::EmptyUrl,
            Self::InvalidConfig(_) | Self::Json(_) => ErrorCode::InvalidConfig,
            Self::Spawn(_) => ErrorCode::SpawnError,
            Self::ToolFailed { .. } => ErrorCode::ToolFailed,
            Self::WorkerBusy => ErrorCode::WorkerBusy,
            Self::File(_) => ErrorCode::FileError,
        }
    }
}

pub type Result<T> = std::result::Result<T, HoardError>;
