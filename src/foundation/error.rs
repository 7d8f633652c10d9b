/// Convenience result type used across Prevue.
pub type PrevueResult<T> = Result<T, PrevueError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Ordinary cache misses and stale completions are *not* errors; they surface
/// as `None` returns or silent discards. This type covers genuinely
/// exceptional states (bad input values, disk IO failures).
#[derive(thiserror::Error, Debug)]
pub enum PrevueError {
    /// Invalid user-provided value (e.g. a zero timebase).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while producing or persisting a cached artifact.
    #[error("cache error: {0}")]
    Cache(String),

    /// Filesystem errors from the disk cache.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrevueError {
    /// Build a [`PrevueError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PrevueError::Cache`] value.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
