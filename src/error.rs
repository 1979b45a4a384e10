//! Error types shared by the recorder, player and metadata store

use std::path::PathBuf;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Microphone permission not granted")]
    PermissionDenied,

    #[error("Failed to initialize encoder: {0}")]
    EncoderInit(String),

    #[error("Failed to finalize encoder: {0}")]
    EncoderFinalize(String),

    #[error("Failed to open decoder: {0}")]
    DecoderInit(String),

    #[error("Failed to delete {path:?}: {source}")]
    FileDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt metadata for {key}: {source}")]
    MetadataCorrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No recording matches {0}")]
    UnknownRecording(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
