//! Error types for device detection

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while querying or watching serial devices
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// None of the requested paths could be watched
    #[error("hardware-change notifications unavailable: {0}")]
    WatchUnavailable(String),

    /// A specific path could not be watched
    #[error("failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    /// Filesystem notification error
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}
