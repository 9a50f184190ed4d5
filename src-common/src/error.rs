//! Error types shared by the CLI and the hardware backends.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the audio HAL or handling commands.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Could not find default output device.")]
    NoDefaultOutput,

    #[error("'{0}' driver not installed/loaded.")]
    DriverNotInstalled(String),

    /// A HAL call returned a non-zero `OSStatus`.
    #[error("{operation} failed: {status}")]
    OsStatus { operation: &'static str, status: i32 },

    #[error("Could not get volume")]
    VolumeUnavailable,

    #[error("invalid aggregate description: {0}")]
    InvalidDescriptor(String),

    /// Bad command line value; the message is a complete usage line.
    #[error("{0}")]
    Usage(String),

    /// Unrecognised verb or sub-verb.
    #[error("Unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },

    #[error("volume stash: {0}")]
    Stash(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load config {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("audio control is only supported on macOS")]
    UnsupportedPlatform,
}

impl AudioError {
    /// Wrap a non-zero `OSStatus`.
    pub fn os(operation: &'static str, status: i32) -> Self {
        AudioError::OsStatus { operation, status }
    }

    /// Errors that should be printed verbatim rather than as `Error: ...`.
    pub fn is_usage(&self) -> bool {
        matches!(self, AudioError::Usage(_) | AudioError::Unknown { .. })
    }
}
