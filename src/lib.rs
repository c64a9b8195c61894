//! A document ingestion engine: format decoding, text cleanup, quality
//! assessment, token-aware chunking, and a work-stealing parallel
//! substrate.
//!
//! ```no_run
//! use r3m::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let result = engine.process_document_from_bytes("note.txt", b"hello world").unwrap();
//! assert!(result.processing_success);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
mod engine;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod logging;
pub mod parallel;
pub mod simd;
pub mod text;
pub mod tokenizer;

pub use config::{ConfigMap, EngineConfig};
pub use document::{BatchResult, DocumentResult, EngineMetrics, EngineStatus, ProcessingStats, TextExtractor};
pub use engine::Engine;
pub use error::{Error, Result};

/// Installs the given progress handler as the global one and disables
/// host-library internal parallelism (BLAS/OMP-style env vars), matching
/// what [`Engine::new`] does internally. Callers that build an `Engine`
/// directly don't need to call this; it exists for callers who want
/// logging/env setup before constructing anything.
pub fn init(handler: std::sync::Arc<dyn logging::ProgressHandler>) {
    logging::init_progress_handler(handler);
    parallel::disable_library_parallelism();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_processes_a_document() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let text = "Rust ownership and borrowing rules enforce memory safety without a garbage collector \
            and this sentence is long enough to pass the default quality thresholds reliably in tests.";
        let result = engine.process_document_from_bytes("note.txt", text.as_bytes()).unwrap();
        assert!(result.processing_success);
        assert!(result.content_quality_score > 0.0);
    }
}
