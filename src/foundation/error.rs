/// Result alias used throughout the crate.
pub type FilterChainResult<T> = Result<T, FilterChainError>;

/// Errors produced by pipelines, surface allocation and backend drawing.
///
/// Compositing itself never hands these to the host: a failed frame is reported as
/// [`CompositeOutcome::Aborted`](crate::CompositeOutcome::Aborted).
#[derive(thiserror::Error, Debug)]
pub enum FilterChainError {
    /// Invalid argument, unknown filter id or out-of-range index.
    #[error("validation error: {0}")]
    Validation(String),

    /// A render target could not be created.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// A backend draw call failed.
    #[error("draw error: {0}")]
    Draw(String),

    /// Foreign error (image decoding, I/O).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilterChainError {
    /// Build a [`FilterChainError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FilterChainError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`FilterChainError::Draw`].
    pub fn draw(msg: impl Into<String>) -> Self {
        Self::Draw(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
