//! Error types for the ingestion pipeline.

use thiserror::Error;

/// The error kinds a document or pool operation can fail with.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// The requested file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The file exceeds `max_file_size`.
    #[error("file too large: {0} bytes exceeds limit of {1} bytes")]
    TooLarge(usize, usize),

    /// The file extension has no registered decoder.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// A format decoder failed to produce text.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// All content was removed during cleanup, leaving nothing to chunk.
    #[error("content empty after cleanup")]
    EmptyAfterCleanup,

    /// Metadata exceeded the configured percentage of the chunk budget and
    /// was cleared. Informational, not fatal.
    #[error("metadata suffix exceeded budget and was cleared")]
    MetadataOverflow,

    /// A chunking invariant was violated; indicates a bug in the chunker.
    #[error("chunker invariant violated: {0}")]
    ChunkerInvariantViolation(String),

    /// A task was submitted to a pool that has already shut down.
    #[error("thread pool is shut down")]
    PoolShutdown,

    /// Configuration was invalid at `init` time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
