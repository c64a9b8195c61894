//! Logging and progress reporting for the ingestion pipeline.
//!
//! This module provides a unified system for progress reporting that can be
//! controlled by library users independent of the `tracing`/`log` backend
//! they have wired up.

use std::sync::Arc;

/// Progress event types for different stages of document processing.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A document's pipeline run started.
    ProcessingStarted {
        file_name: String,
        file_size: usize,
    },
    /// Text extraction (format decoding) finished.
    ExtractionCompleted {
        text_length: usize,
        extension: String,
    },
    /// Section processing started for a document.
    ChunkingStarted {
        total_chars: usize,
        section_count: usize,
    },
    /// A batch of documents is being processed through the thread pool.
    BatchProgress {
        batch_number: usize,
        total_batches: usize,
        documents_processed: usize,
        total_documents: usize,
    },
    /// Work-stealing / pool statistics snapshot.
    PoolStats {
        queued: usize,
        active: usize,
        steals: usize,
    },
    /// Quality assessment ran for a document or chunk.
    QualityAssessed {
        is_high_quality: bool,
        quality_reason: String,
    },
    /// Chunk emission finished for a document.
    ChunkingCompleted {
        chunk_count: usize,
        high_quality_chunks: usize,
    },
    /// A document pipeline run completed.
    ProcessingCompleted {
        file_name: String,
        processing_time_ms: u64,
    },
    /// A document's processing time exceeded the configured soft timeout.
    /// Advisory: the document still ran to completion.
    SoftTimeoutExceeded {
        file_name: String,
        processing_time_ms: u64,
        soft_timeout_ms: u64,
    },
    /// An error occurred during processing.
    Error {
        operation: String,
        error: String,
    },
    /// Debug information.
    Debug {
        operation: String,
        details: String,
    },
}

/// Trait for handling progress events.
pub trait ProgressHandler: Send + Sync {
    /// Handle a progress event.
    fn handle_progress(&self, event: ProgressEvent);
}

/// Console progress handler that outputs to stdout with pipeline stage tags.
pub struct ConsoleProgressHandler {
    /// Whether to show progress messages.
    pub show_progress: bool,
    /// Whether to show debug information.
    pub show_debug: bool,
}

impl ConsoleProgressHandler {
    /// Create a new console handler with default settings.
    pub fn new() -> Self {
        Self {
            show_progress: true,
            show_debug: false,
        }
    }

    /// Create a quiet console handler (only errors).
    pub fn quiet() -> Self {
        Self {
            show_progress: false,
            show_debug: false,
        }
    }

    /// Create a verbose console handler (everything including debug).
    pub fn verbose() -> Self {
        Self {
            show_progress: true,
            show_debug: true,
        }
    }

    fn format_message(&self, tag: &str, message: &str) -> String {
        format!("[{}] {}", tag, message)
    }
}

impl Default for ConsoleProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for ConsoleProgressHandler {
    fn handle_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ProcessingStarted { file_name, file_size } => {
                if self.show_progress {
                    println!("{}", self.format_message("process",
                        &format!("{} ({} bytes)", file_name, file_size)));
                }
            }
            ProgressEvent::ExtractionCompleted { text_length, extension } => {
                if self.show_debug {
                    println!("{}", self.format_message("extract",
                        &format!("{} -- {} chars extracted", extension, text_length)));
                }
            }
            ProgressEvent::ChunkingStarted { total_chars, section_count } => {
                if self.show_progress {
                    println!("{}", self.format_message("chunking",
                        &format!("{} sections ({} chars total)", section_count, total_chars)));
                }
            }
            ProgressEvent::BatchProgress { batch_number: _, total_batches: _, documents_processed, total_documents } => {
                if self.show_progress {
                    println!("{}", self.format_message("progress",
                        &format!("{}/{} documents processed", documents_processed, total_documents)));
                }
            }
            ProgressEvent::PoolStats { queued, active, steals } => {
                if self.show_debug {
                    println!("{}", self.format_message("pool",
                        &format!("queued={} active={} steals={}", queued, active, steals)));
                }
            }
            ProgressEvent::QualityAssessed { is_high_quality, quality_reason } => {
                if self.show_debug {
                    println!("{}", self.format_message("quality",
                        &format!("high_quality={} ({})", is_high_quality, quality_reason)));
                }
            }
            ProgressEvent::ChunkingCompleted { chunk_count, high_quality_chunks } => {
                if self.show_progress {
                    println!("{}", self.format_message("chunking",
                        &format!("{} chunks emitted ({} high quality)", chunk_count, high_quality_chunks)));
                }
            }
            ProgressEvent::ProcessingCompleted { file_name, processing_time_ms } => {
                if self.show_progress {
                    println!("{}", self.format_message("done",
                        &format!("{} in {}ms", file_name, processing_time_ms)));
                }
            }
            ProgressEvent::SoftTimeoutExceeded { file_name, processing_time_ms, soft_timeout_ms } => {
                eprintln!(
                    "{}",
                    self.format_message("timeout", &format!("{} took {}ms (budget {}ms)", file_name, processing_time_ms, soft_timeout_ms))
                );
            }
            ProgressEvent::Error { operation, error } => {
                // Always show errors.
                eprintln!("{}", self.format_message("error", &format!("{}: {}", operation, error)));
            }
            ProgressEvent::Debug { operation, details } => {
                if self.show_debug {
                    println!("{}", self.format_message("debug", &format!("{}: {}", operation, details)));
                }
            }
        }
    }
}

/// Silent progress handler that does nothing.
pub struct SilentProgressHandler;

impl ProgressHandler for SilentProgressHandler {
    fn handle_progress(&self, _event: ProgressEvent) {}
}

/// Handler that integrates with the standard `log` crate.
pub struct LogProgressHandler;

impl ProgressHandler for LogProgressHandler {
    fn handle_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ProcessingStarted { file_name, file_size } => {
                log::info!("processing started: {} ({} bytes)", file_name, file_size);
            }
            ProgressEvent::ExtractionCompleted { text_length, extension } => {
                log::debug!("extraction completed: {} chars from {}", text_length, extension);
            }
            ProgressEvent::ChunkingStarted { total_chars, section_count } => {
                log::info!("chunking started: {} sections, {} chars", section_count, total_chars);
            }
            ProgressEvent::BatchProgress { batch_number, total_batches: _, documents_processed, total_documents } => {
                log::debug!("batch {}: {}/{} documents", batch_number, documents_processed, total_documents);
            }
            ProgressEvent::PoolStats { queued, active, steals } => {
                log::trace!("pool stats: queued={} active={} steals={}", queued, active, steals);
            }
            ProgressEvent::QualityAssessed { is_high_quality, quality_reason } => {
                log::debug!("quality assessed: high_quality={} reason={}", is_high_quality, quality_reason);
            }
            ProgressEvent::ChunkingCompleted { chunk_count, high_quality_chunks } => {
                log::info!("chunking completed: {} chunks ({} high quality)", chunk_count, high_quality_chunks);
            }
            ProgressEvent::ProcessingCompleted { file_name, processing_time_ms } => {
                log::info!("processing completed: {} in {}ms", file_name, processing_time_ms);
            }
            ProgressEvent::SoftTimeoutExceeded { file_name, processing_time_ms, soft_timeout_ms } => {
                log::warn!("soft timeout exceeded: {} took {}ms (budget {}ms)", file_name, processing_time_ms, soft_timeout_ms);
            }
            ProgressEvent::Error { operation, error } => {
                log::error!("{}: {}", operation, error);
            }
            ProgressEvent::Debug { operation, details } => {
                log::debug!("{}: {}", operation, details);
            }
        }
    }
}

/// Global progress handler.
static PROGRESS_HANDLER: std::sync::OnceLock<Arc<dyn ProgressHandler>> = std::sync::OnceLock::new();

/// Initialize the global progress handler. No-op if already initialized.
pub fn init_progress_handler(handler: Arc<dyn ProgressHandler>) {
    let _ = PROGRESS_HANDLER.set(handler);
}

/// Get the current progress handler, or create a default one.
fn get_progress_handler() -> Arc<dyn ProgressHandler> {
    PROGRESS_HANDLER.get_or_init(|| Arc::new(ConsoleProgressHandler::new())).clone()
}

/// Report a progress event to the currently installed handler.
pub fn report_progress(event: ProgressEvent) {
    let handler = get_progress_handler();
    handler.handle_progress(event);
}

/// Convenience macro for a debug-tagged progress event.
#[macro_export]
macro_rules! progress_debug {
    ($operation:expr, $($arg:tt)*) => {
        $crate::logging::report_progress($crate::logging::ProgressEvent::Debug {
            operation: $operation.to_string(),
            details: format!($($arg)*),
        });
    };
}

/// Convenience macro for an error-tagged progress event.
#[macro_export]
macro_rules! progress_error {
    ($operation:expr, $($arg:tt)*) => {
        $crate::logging::report_progress($crate::logging::ProgressEvent::Error {
            operation: $operation.to_string(),
            error: format!($($arg)*),
        });
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_handler_formatting() {
        let handler = ConsoleProgressHandler::new();
        let message = handler.format_message("chunking", "Test message");
        assert!(message.contains("[chunking]"));
        assert!(message.contains("Test message"));
    }

    #[test]
    fn test_progress_events_do_not_panic() {
        let handler = ConsoleProgressHandler::quiet();
        handler.handle_progress(ProgressEvent::ProcessingStarted {
            file_name: "doc.txt".to_string(),
            file_size: 1024,
        });
        handler.handle_progress(ProgressEvent::Error {
            operation: "extract".to_string(),
            error: "boom".to_string(),
        });
    }
}
