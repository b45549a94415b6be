//! Custom error types for the affix-hack crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A flag refers to an affix class that was never defined.
    #[error("Unknown affix class: {0}")]
    UnknownClass(String),

    /// Affix expansion of a single base word went deeper than allowed,
    /// usually because of a cyclic continuation graph.
    #[error("Traversal depth {depth} exceeded while expanding '{word}'")]
    TraversalDepthExceeded { word: String, depth: usize },

    /// A cache entry could not be read back.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Encoding or decoding a cache snapshot failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The dictionary archive is structurally invalid or uses an unsupported feature.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The cipher transform rejected a parameter combination.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// The plaintext scorer could not score a sample.
    #[error("Scoring failed: {0}")]
    Score(String),

    /// Data does not conform to the expected format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl From<serde_cbor::Error> for EngineError {
    fn from(e: serde_cbor::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

/// A convenience `Result` type alias using the crate's `EngineError` type.
pub type Result<T> = std::result::Result<T, EngineError>;
