//! Report error types

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that halt a report run
///
/// Every variant is fatal: the pipeline stops at the first one and no report
/// is written.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deadline of {0:?} exceeded while listing artifacts")]
    Deadline(std::time::Duration),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReportError {
    pub(crate) fn unreachable(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::Unreachable(format!("{}: {}", operation, cause))
    }

    pub(crate) fn malformed(what: &str, cause: impl std::fmt::Display) -> Self {
        Self::Malformed(format!("{}: {}", what, cause))
    }
}
