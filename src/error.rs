use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the matching engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The query inverting delimiter was more than one character long.
    #[error("query inverting delimiter must be a single character")]
    InvertingDelimiter,

    /// An unrecognised match mode string was supplied.
    #[error("unknown match mode '{0}'")]
    UnknownMatchMode(String),

    /// An unrecognised highlight mode string was supplied.
    #[error("unknown highlight mode '{0}'")]
    UnknownHighlightMode(String),

    /// The candidate source failed while producing an item. The underlying
    /// error is surfaced verbatim.
    #[error(transparent)]
    Source(anyhow::Error),

    /// An item that matched during the scoring pass failed to match again
    /// during the highlight pass.
    #[error("failed to re-match known match '{item}' during highlight pass")]
    HighlightRematch { item: String },

    /// A worker thread panicked during matching. Carries the first worker's
    /// panic message.
    #[error("worker thread panicked during matching: {0}")]
    Worker(String),
}
