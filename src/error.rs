//! Error types for echostream
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for echostream
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (invalid chunk size, filter geometry, arguments)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback pipeline errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using echostream Error
pub type Result<T> = std::result::Result<T, Error>;
