//! echostream runtime configuration

use std::path::PathBuf;

/// Playback configuration, assembled from command-line arguments at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw PCM input file (interleaved S16LE stereo, no header)
    pub file: PathBuf,

    /// Output device name (None = system default device)
    pub device: Option<String>,

    /// Requested device period in frames
    pub period_frames: u32,
}
