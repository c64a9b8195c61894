//! Document-processing data model (spec §6): per-document results, running
//! statistics, and engine-level metrics.
//!
//! Grounded on `original_source/include/r3m/core/document_processor.hpp`'s
//! `DocumentResult`/`ProcessingStats` and `engine.hpp`'s `EngineStatus`/
//! `EngineMetrics`.

pub mod extractors;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use extractors::{extension_of, mime_type_for, HtmlExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};

use crate::chunking::ChunkingResult;

/// The result of processing one document through extraction, cleanup, and
/// quality assessment (chunking is attached separately, see
/// [`DocumentResult::chunking`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentResult {
    pub file_name: String,
    pub file_extension: String,
    pub mime_type: String,
    pub file_size: usize,

    pub text_content: String,
    pub metadata: BTreeMap<String, String>,

    pub processing_success: bool,
    pub error_message: Option<String>,
    pub processing_time_ms: f64,
    /// Set when `processing_time_ms` exceeded the configured soft timeout.
    /// Advisory only: the document still completed and its other fields are
    /// fully populated.
    pub timed_out: bool,

    pub content_quality_score: f64,
    pub information_density: f64,
    pub is_high_quality: bool,
    pub quality_reason: String,

    pub chunking: Option<ChunkingResult>,
}

impl DocumentResult {
    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            processing_success: false,
            error_message: Some(error.into()),
            quality_reason: "Processing failed".to_string(),
            ..Default::default()
        }
    }
}

/// Running counters across every document an [`crate::Engine`] has processed,
/// mirroring `DocumentProcessor::ProcessingStats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_processing: usize,
    pub failed_processing: usize,
    pub filtered_out: usize,
    pub avg_processing_time_ms: f64,
    pub total_text_extracted: usize,
    pub avg_content_quality_score: f64,

    pub pdf_files_processed: usize,
    pub text_files_processed: usize,
    pub html_files_processed: usize,
}

impl ProcessingStats {
    /// Folds one document's result into the running counters. Called under
    /// the engine's stats mutex, so no concurrency concerns here.
    pub fn record(&mut self, result: &DocumentResult, passed_filter: bool) {
        self.total_files_processed += 1;
        if result.processing_success {
            self.successful_processing += 1;
            self.total_text_extracted += result.text_content.len();

            let n = self.successful_processing as f64;
            self.avg_processing_time_ms += (result.processing_time_ms - self.avg_processing_time_ms) / n;
            self.avg_content_quality_score += (result.content_quality_score - self.avg_content_quality_score) / n;

            match result.file_extension.as_str() {
                "pdf" => self.pdf_files_processed += 1,
                "html" | "htm" => self.html_files_processed += 1,
                _ => self.text_files_processed += 1,
            }
        } else {
            self.failed_processing += 1;
        }
        if !passed_filter {
            self.filtered_out += 1;
        }
    }
}

/// Engine lifecycle state, mirroring `engine.hpp`'s `EngineStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error,
}

/// Point-in-time engine health/throughput snapshot, mirroring `EngineMetrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub status: EngineStatus,
    #[serde(skip, default = "Instant::now")]
    pub start_time: Instant,
    #[serde(skip, default = "Instant::now")]
    pub last_activity: Instant,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_response_time_ms: f64,
    pub active_connections: usize,

    pub pdf_documents_processed: usize,
    pub text_documents_processed: usize,
    pub html_documents_processed: usize,
}

impl EngineMetrics {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            status: EngineStatus::Uninitialized,
            start_time: now,
            last_activity: now,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            avg_response_time_ms: 0.0,
            active_connections: 0,
            pdf_documents_processed: 0,
            text_documents_processed: 0,
            html_documents_processed: 0,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn record_request(&mut self, success: bool, response_time_ms: f64) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        let n = self.total_requests as f64;
        self.avg_response_time_ms += (response_time_ms - self.avg_response_time_ms) / n;
        self.last_activity = Instant::now();
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of processing a batch of documents as a single pool task,
/// preserving input order within the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<DocumentResult>,
    pub batch_size: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_time_ms: f64,
}

impl BatchResult {
    pub fn from_results(results: Vec<DocumentResult>, processing_time_ms: f64) -> Self {
        let successful = results.iter().filter(|r| r.processing_success).count();
        let failed = results.len() - successful;
        Self { batch_size: results.len(), successful, failed, processing_time_ms, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_stats_tracks_averages_incrementally() {
        let mut stats = ProcessingStats::default();
        let mut r1 = DocumentResult::failed("a.txt", "x");
        r1.processing_success = true;
        r1.processing_time_ms = 10.0;
        r1.content_quality_score = 0.5;
        r1.file_extension = "txt".to_string();
        stats.record(&r1, true);

        let mut r2 = r1.clone();
        r2.processing_time_ms = 20.0;
        r2.content_quality_score = 0.9;
        stats.record(&r2, false);

        assert_eq!(stats.total_files_processed, 2);
        assert_eq!(stats.successful_processing, 2);
        assert_eq!(stats.filtered_out, 1);
        assert!((stats.avg_processing_time_ms - 15.0).abs() < 1e-9);
        assert!((stats.avg_content_quality_score - 0.7).abs() < 1e-9);
        assert_eq!(stats.text_files_processed, 2);
    }

    #[test]
    fn batch_result_counts_success_and_failure() {
        let results = vec![DocumentResult { processing_success: true, ..Default::default() }, DocumentResult::failed("b", "err")];
        let batch = BatchResult::from_results(results, 5.0);
        assert_eq!(batch.batch_size, 2);
        assert_eq!(batch.successful, 1);
        assert_eq!(batch.failed, 1);
    }

    #[test]
    fn engine_metrics_tracks_running_average_response_time() {
        let mut metrics = EngineMetrics::new();
        metrics.record_request(true, 100.0);
        metrics.record_request(true, 200.0);
        assert_eq!(metrics.total_requests, 2);
        assert!((metrics.avg_response_time_ms - 150.0).abs() < 1e-9);
    }
}
