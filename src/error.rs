// Error types shared by the scheduler core and its host collaborators

/// Failure reported by an optional host feature (keep-awake, storage, vibration)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Host feature not supported: {0}")]
    Unsupported(&'static str),

    #[error("Host call failed: {0}")]
    Failed(String),
}

/// Metronome error types
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    /// No audio clock could be created; playback cannot start
    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] HostError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
