//! The top-level orchestrator: extraction, quality assessment, chunking,
//! and the parallel pipeline over the work-stealing pool (spec §6).
//!
//! Grounded on `original_source/include/r3m/core/engine.hpp`'s `Engine`
//! (status/metrics, `process_document`/`process_documents_parallel`) and
//! `document_processor.hpp`'s pipeline method list (`validate_file`,
//! `extract_text`, `clean_text`, `extract_metadata`, `assess_quality`,
//! `filter_document`).
//!
//! Internally split into [`EngineCore`] (the `Arc`-wrapped, `'static`
//! immutable pipeline state safe to clone into pool closures) and
//! [`Engine`] (owns the pool and lifecycle state, neither of which is
//! `Clone`).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::chunking::{AdvancedChunker, AdvancedChunkerConfig, ChunkingResult, QualityAssessor, QualityConfig, Section};
use crate::config::EngineConfig;
use crate::document::extractors::{self, HtmlExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::document::{BatchResult, DocumentResult, EngineMetrics, EngineStatus, ProcessingStats};
use crate::error::{Error, Result};
use crate::logging::{self, ProgressEvent};
use crate::parallel::ThreadPool;
use crate::text;
use crate::tokenizer::{TokenizerFactory, TokenizerKind};

/// Shared, cheaply-cloneable pipeline state. Every field here must be
/// `Send + Sync + 'static` so it can be captured by `'static` closures
/// submitted to the thread pool.
struct EngineCore {
    config: EngineConfig,
    quality_assessor: QualityAssessor,
    chunker: AdvancedChunker,
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
    stats: Mutex<ProcessingStats>,
    metrics: Mutex<EngineMetrics>,
}

impl EngineCore {
    fn extractor_for(&self, extension: &str) -> Option<Arc<dyn TextExtractor>> {
        self.extractors.get(extension).cloned()
    }

    /// Runs the full single-document pipeline: extract, clean, assess
    /// quality, optionally chunk.
    #[tracing::instrument(skip_all, fields(file_name, byte_len = bytes.len(), with_chunking))]
    fn process_bytes(&self, file_name: &str, bytes: &[u8], with_chunking: bool) -> DocumentResult {
        let start = Instant::now();
        let extension = extractors::extension_of(file_name);

        logging::report_progress(ProgressEvent::ProcessingStarted { file_name: file_name.to_string(), file_size: bytes.len() });

        if bytes.len() > self.config.document_processing.max_file_size {
            let err = Error::TooLarge(bytes.len(), self.config.document_processing.max_file_size);
            return DocumentResult::failed(file_name, err.to_string());
        }

        let Some(extractor) = self.extractor_for(&extension) else {
            let err = Error::UnsupportedType(extension.clone());
            return DocumentResult::failed(file_name, err.to_string());
        };

        let raw_text = match extractor.extract(bytes, file_name) {
            Ok(t) => t,
            Err(e) => return DocumentResult::failed(file_name, e.to_string()),
        };

        logging::report_progress(ProgressEvent::ExtractionCompleted { text_length: raw_text.len(), extension: extension.clone() });

        let tp = &self.config.document_processing.text_processing;
        let mut cleaned = if tp.remove_html_tags && extension != "html" && extension != "htm" {
            text::remove_html_tags(&raw_text)
        } else {
            raw_text
        };
        cleaned = text::clean_text(&cleaned);
        if tp.normalize_whitespace {
            cleaned = text::normalize_whitespace(&cleaned);
        }

        let truncated = if cleaned.chars().count() > self.config.document_processing.max_text_length {
            cleaned.chars().take(self.config.document_processing.max_text_length).collect()
        } else {
            cleaned
        };

        if truncated.trim().is_empty() {
            let mut result = DocumentResult::failed(file_name, Error::EmptyAfterCleanup.to_string());
            result.file_extension = extension.clone();
            result.mime_type = extractors::mime_type_for(&extension);
            result.file_size = bytes.len();
            return result;
        }

        let metrics = self.quality_assessor.assess_quality(&truncated);
        logging::report_progress(ProgressEvent::QualityAssessed {
            is_high_quality: metrics.is_high_quality,
            quality_reason: metrics.quality_reason.clone(),
        });

        let chunking = if with_chunking && self.config.document_processing.enable_chunking {
            let result = self.chunker.chunk_document(file_name, &truncated, "", &BTreeMap::new(), None);
            logging::report_progress(ProgressEvent::ChunkingCompleted {
                chunk_count: result.total_chunks,
                high_quality_chunks: result.high_quality_chunks,
            });
            Some(result)
        } else {
            None
        };

        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        logging::report_progress(ProgressEvent::ProcessingCompleted {
            file_name: file_name.to_string(),
            processing_time_ms: processing_time_ms as u64,
        });

        let soft_timeout_ms = self.config.document_processing.soft_timeout_ms;
        let timed_out = soft_timeout_ms > 0 && processing_time_ms > soft_timeout_ms as f64;
        if timed_out {
            logging::report_progress(ProgressEvent::SoftTimeoutExceeded {
                file_name: file_name.to_string(),
                processing_time_ms: processing_time_ms as u64,
                soft_timeout_ms,
            });
        }

        DocumentResult {
            file_name: file_name.to_string(),
            file_extension: extension.clone(),
            mime_type: extractors::mime_type_for(&extension),
            file_size: bytes.len(),
            text_content: truncated,
            metadata: BTreeMap::new(),
            processing_success: true,
            error_message: None,
            processing_time_ms,
            timed_out,
            content_quality_score: metrics.content_quality_score,
            information_density: metrics.information_density,
            is_high_quality: metrics.is_high_quality,
            quality_reason: metrics.quality_reason,
            chunking,
        }
    }

    fn passes_quality_filter(&self, result: &DocumentResult) -> bool {
        let qf = &self.config.document_processing.quality_filtering;
        if !qf.enabled {
            return true;
        }
        if qf.filter_empty_documents && result.text_content.trim().is_empty() {
            return false;
        }
        if qf.filter_low_quality_documents && !result.is_high_quality {
            return false;
        }
        true
    }

    fn record(&self, result: &DocumentResult, passed_filter: bool) {
        self.stats.lock().record(result, passed_filter);
        self.metrics.lock().record_request(result.processing_success, result.processing_time_ms);
    }
}

/// The document ingestion engine: format decoding, cleanup, quality
/// assessment, chunking, and the work-stealing parallel substrate.
pub struct Engine {
    core: Arc<EngineCore>,
    pool: Mutex<Option<ThreadPool>>,
    status: Mutex<EngineStatus>,
}

impl Engine {
    /// Builds and starts an engine from an effective configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        crate::parallel::disable_library_parallelism();

        let tokenizer = TokenizerFactory::create(TokenizerKind::Basic, 8192);
        let quality_config = QualityConfig {
            min_content_quality_score: config.document_processing.quality_filtering.min_content_quality_score,
            min_information_density: config.document_processing.quality_filtering.min_information_density,
            min_content_length: config.document_processing.quality_filtering.min_content_length,
            max_content_length: config.document_processing.quality_filtering.max_content_length,
            ..QualityConfig::default()
        };
        let quality_assessor = QualityAssessor::new(quality_config);

        let chunker_config = AdvancedChunkerConfig {
            chunk_token_limit: config.chunking.chunk_token_limit,
            chunk_min_content: config.chunking.chunk_min_content,
            mini_chunk_size: config.chunking.mini_chunk_size,
            blurb_size: config.chunking.blurb_size,
            large_chunk_ratio: config.chunking.large_chunk_ratio,
            max_metadata_percentage: config.chunking.max_metadata_percentage,
            contextual_rag_reserved_tokens: config.chunking.contextual_rag_reserved_tokens,
            enable_multipass: config.chunking.enable_multipass,
            enable_large_chunks: config.chunking.enable_large_chunks,
            enable_contextual_rag: config.chunking.enable_contextual_rag,
            include_metadata: config.chunking.include_metadata,
            enable_quality_filtering: config.document_processing.quality_filtering.enabled,
            min_chunk_quality: config.document_processing.quality_filtering.min_content_quality_score,
            min_chunk_density: config.document_processing.quality_filtering.min_information_density,
            min_chunk_length: config.document_processing.quality_filtering.min_content_length,
            max_chunk_length: config.document_processing.quality_filtering.max_content_length,
        };
        let chunker = AdvancedChunker::new(tokenizer, quality_assessor.clone(), chunker_config);

        let mut extractors: HashMap<String, Arc<dyn TextExtractor>> = HashMap::new();
        extractors.insert("txt".to_string(), Arc::new(PlainTextExtractor));
        extractors.insert("md".to_string(), Arc::new(PlainTextExtractor));
        extractors.insert("markdown".to_string(), Arc::new(PlainTextExtractor));
        extractors.insert("html".to_string(), Arc::new(HtmlExtractor));
        extractors.insert("htm".to_string(), Arc::new(HtmlExtractor));
        extractors.insert("pdf".to_string(), Arc::new(PdfExtractor));

        let core = Arc::new(EngineCore {
            config: config.clone(),
            quality_assessor,
            chunker,
            extractors,
            stats: Mutex::new(ProcessingStats::default()),
            metrics: Mutex::new(EngineMetrics::new()),
        });

        let pool = ThreadPool::new(config.document_processing.max_workers);
        core.metrics.lock().status = EngineStatus::Running;

        Ok(Self { core, pool: Mutex::new(Some(pool)), status: Mutex::new(EngineStatus::Running) })
    }

    /// Registers (or overrides) the decoder used for `extension`.
    pub fn register_extractor(&mut self, extension: impl Into<String>, extractor: Arc<dyn TextExtractor>) {
        Arc::get_mut(&mut self.core)
            .expect("register_extractor must be called before the engine is shared across threads")
            .extractors
            .insert(extension.into().to_ascii_lowercase(), extractor);
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    pub fn get_statistics(&self) -> ProcessingStats {
        self.core.stats.lock().clone()
    }

    pub fn get_metrics(&self) -> EngineMetrics {
        self.core.metrics.lock().clone()
    }

    pub fn supported_file_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.core.extractors.keys().cloned().collect();
        types.sort();
        types
    }

    /// Processes a single document from disk, without chunking.
    pub fn process_document(&self, path: impl AsRef<Path>) -> Result<DocumentResult> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|_| Error::NotFound(path.display().to_string()))?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let result = self.core.process_bytes(&file_name, &bytes, false);
        self.core.record(&result, self.core.passes_quality_filter(&result));
        Ok(result)
    }

    /// Processes a single document from disk and chunks it.
    pub fn process_document_with_chunking(&self, path: impl AsRef<Path>) -> Result<DocumentResult> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|_| Error::NotFound(path.display().to_string()))?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let result = self.core.process_bytes(&file_name, &bytes, true);
        self.core.record(&result, self.core.passes_quality_filter(&result));
        Ok(result)
    }

    /// Processes in-memory bytes as if they were `file_name`.
    pub fn process_document_from_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<DocumentResult> {
        let result = self.core.process_bytes(file_name, bytes, self.core.config.document_processing.enable_chunking);
        self.core.record(&result, self.core.passes_quality_filter(&result));
        Ok(result)
    }

    /// Processes many documents through the pool, returning results in
    /// completion order (first-to-finish, first-returned).
    #[tracing::instrument(skip_all, fields(file_count = paths.len()))]
    pub fn process_documents_parallel(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<DocumentResult>> {
        let guard = self.pool.lock();
        let pool = guard.as_ref().ok_or(Error::PoolShutdown)?;

        let (tx, rx) = mpsc::channel();
        let mut submitted = 0usize;
        for path in paths {
            let path = path.as_ref().to_path_buf();
            let core = Arc::clone(&self.core);
            let handle = pool.submit(move || {
                let result = match fs::read(&path) {
                    Ok(bytes) => {
                        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                        core.process_bytes(&file_name, &bytes, false)
                    }
                    Err(_) => DocumentResult::failed(path.display().to_string(), Error::NotFound(path.display().to_string()).to_string()),
                };
                core.record(&result, core.passes_quality_filter(&result));
                result
            })?;
            // Forward each task's own result into the shared channel as
            // soon as it completes, rather than joining in submission order.
            let tx = tx.clone();
            std::thread::spawn(move || {
                if let Ok(result) = handle.join() {
                    let _ = tx.send(result);
                }
            });
            submitted += 1;
        }
        drop(tx);

        let mut results = Vec::with_capacity(submitted);
        for _ in 0..submitted {
            if let Ok(result) = rx.recv() {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Processes documents in fixed-size sub-batches, each submitted as a
    /// single pool task. Order within a batch follows input order; batches
    /// themselves complete in arbitrary order.
    #[tracing::instrument(skip_all, fields(file_count = paths.len()))]
    pub fn process_documents_batch(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<BatchResult>> {
        let guard = self.pool.lock();
        let pool = guard.as_ref().ok_or(Error::PoolShutdown)?;

        let batch_size = crate::parallel::optimal_batch_size(
            self.core.config.document_processing.batch_size.max(1),
            paths.len(),
            pool.num_workers(),
        );
        let chunks: Vec<Vec<std::path::PathBuf>> =
            paths.chunks(batch_size).map(|c| c.iter().map(|p| p.as_ref().to_path_buf()).collect()).collect();
        let total_batches = chunks.len();

        let (tx, rx) = mpsc::channel();
        for (batch_number, batch) in chunks.into_iter().enumerate() {
            let core = Arc::clone(&self.core);
            let handle = pool.submit(move || {
                let start = Instant::now();
                let results: Vec<DocumentResult> = batch
                    .iter()
                    .map(|path| match fs::read(path) {
                        Ok(bytes) => {
                            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                            let result = core.process_bytes(&file_name, &bytes, false);
                            core.record(&result, core.passes_quality_filter(&result));
                            result
                        }
                        Err(_) => {
                            let result =
                                DocumentResult::failed(path.display().to_string(), Error::NotFound(path.display().to_string()).to_string());
                            core.record(&result, false);
                            result
                        }
                    })
                    .collect();
                logging::report_progress(ProgressEvent::BatchProgress {
                    batch_number,
                    total_batches,
                    documents_processed: results.len(),
                    total_documents: results.len(),
                });
                BatchResult::from_results(results, start.elapsed().as_secs_f64() * 1000.0)
            })?;
            let tx = tx.clone();
            std::thread::spawn(move || {
                if let Ok(result) = handle.join() {
                    let _ = tx.send(result);
                }
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total_batches);
        for _ in 0..total_batches {
            if let Ok(result) = rx.recv() {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Processes many documents, applying the configured quality filter and
    /// dropping documents that fail it from the returned set.
    pub fn process_documents_with_filtering(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<DocumentResult>> {
        let all = self.process_documents_parallel(paths)?;
        Ok(all.into_iter().filter(|r| self.core.passes_quality_filter(r)).collect())
    }

    /// Chunks an already-extracted document body directly, bypassing format
    /// decoding. Useful for callers that already have plain text.
    pub fn chunk_text(&self, document_id: &str, content: &str, title: &str, metadata: &BTreeMap<String, String>) -> ChunkingResult {
        self.core.chunker.chunk_document(document_id, content, title, metadata, None)
    }

    /// Chunks pre-structured sections (e.g. containing explicit image
    /// sections) rather than a single flat content string.
    pub fn chunk_sections(&self, document_id: &str, sections: &[Section], title: &str, metadata: &BTreeMap<String, String>) -> ChunkingResult {
        self.core.chunker.chunk_document(document_id, "", title, metadata, Some(sections))
    }

    pub fn pool_queue_size(&self) -> usize {
        self.pool.lock().as_ref().map(|p| p.queue_size()).unwrap_or(0)
    }

    /// Shuts down the worker pool. Further `process_*` calls return
    /// `Error::PoolShutdown`.
    pub fn shutdown(&self) {
        *self.status.lock() = EngineStatus::Stopping;
        if let Some(mut pool) = self.pool.lock().take() {
            pool.shutdown();
        }
        self.core.metrics.lock().status = EngineStatus::Stopped;
        *self.status.lock() = EngineStatus::Stopped;
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.pool.lock().is_some() {
            self.shutdown();
        }
    }
}
