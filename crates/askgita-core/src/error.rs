use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Corpus index not loaded: {0}")]
    IndexNotLoaded(String),

    #[error("Corrupt index: chunk id {id} is out of range for a chunk store of {len} entries")]
    CorruptIndex { id: i64, len: usize },

    #[error("Embedding dimension mismatch: index expects {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index query failed: {0}")]
    Index(String),

    #[error("Completion endpoint unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Completion endpoint rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("Completion endpoint returned no answer")]
    EmptyCompletion,

    #[error("Transcript append failed: {0}")]
    LogAppendFailed(String),

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
