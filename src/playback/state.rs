//! Pipeline lifecycle state

/// Lifecycle of one playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Filling the first output chunks; no playback yet.
    Preloading,
    /// Load+filter and play tasks running concurrently each cycle.
    Running,
    /// End of stream seen; playing out remaining computed chunks.
    Draining,
    /// Terminal; all loaded chunks played, resources released.
    Stopped,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Preloading => write!(f, "preloading"),
            PipelineState::Running => write!(f, "running"),
            PipelineState::Draining => write!(f, "draining"),
            PipelineState::Stopped => write!(f, "stopped"),
        }
    }
}
