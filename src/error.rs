use thiserror::Error;

/// Failures that abort the preview feature for a page load. Nothing here may
/// propagate into host-page code; hosts log and disable the feature instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("isolation surface unavailable: {0}")]
    Surface(String),
    #[error("message decode error: {0}")]
    Message(#[from] serde_json::Error),
}
