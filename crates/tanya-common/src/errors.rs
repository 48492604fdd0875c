//! Top-level error wrapper for the workspace.

#[derive(Debug, thiserror::Error)]
pub enum TanyaError {
    /// A generation-provider failure, flattened to its display message.
    #[error("provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
