use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabGroupError {
    #[error("Unsupported clustering algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedder returned {actual} vectors for {expected} documents")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TabGroupError>;
