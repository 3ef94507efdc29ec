use thiserror::Error;

/// Top-level error type for the SnapLens runtime.
///
/// The four pipeline kinds (`CaptureUnavailable`, `ExtractionFailed`,
/// `InferenceFailed`, `ActivationRejected`) are terminal for the run that
/// produced them; nothing in the core retries them.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("inference failed ({provider}): {message}")]
    InferenceFailed { provider: String, message: String },

    #[error("activation rejected: {0}")]
    ActivationRejected(String),

    #[error("channel closed: {0}")]
    ChannelClosed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnapError {
    /// Whether this failure came from a pipeline stage (as opposed to
    /// plumbing). Pipeline failures end the run silently; plumbing failures
    /// are logged and bubbled.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            SnapError::CaptureUnavailable(_)
                | SnapError::ExtractionFailed(_)
                | SnapError::InferenceFailed { .. }
        )
    }
}
