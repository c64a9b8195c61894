//! End-to-end coverage of the public `Engine` API: extraction, quality
//! filtering, chunking, and the parallel/batch pipelines.

use std::collections::BTreeMap;
use std::io::Write;

use r3m::{ConfigMap, Engine, EngineConfig};

fn long_quality_text() -> &'static str {
    "Rust's ownership and borrowing rules enforce memory safety without a garbage collector. \
     The borrow checker analyzes lifetimes at compile time, rejecting data races and \
     use-after-free bugs before a single test runs. This is fundamentally different from \
     languages relying on runtime reference counting or tracing garbage collection, and it \
     lets systems programmers write highly concurrent code with confidence."
}

#[test]
fn end_to_end_text_document_is_high_quality() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let result = engine.process_document_from_bytes("article.txt", long_quality_text().as_bytes()).unwrap();
    assert!(result.processing_success);
    assert!(result.is_high_quality);
    assert_eq!(result.quality_reason, "High quality content");
}

#[test]
fn html_document_has_tags_stripped_before_scoring() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let html = format!("<html><body><p>{}</p></body></html>", long_quality_text());
    let result = engine.process_document_from_bytes("article.html", html.as_bytes()).unwrap();
    assert!(result.processing_success);
    assert!(!result.text_content.contains('<'));
}

#[test]
fn empty_document_fails_with_empty_after_cleanup() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let result = engine.process_document_from_bytes("empty.txt", b"   \n\t  ").unwrap();
    assert!(!result.processing_success);
}

#[test]
fn unsupported_extension_is_rejected_without_panicking() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let result = engine.process_document_from_bytes("archive.zip", b"PK\x03\x04").unwrap();
    assert!(!result.processing_success);
    assert!(result.error_message.unwrap().contains("unsupported"));
}

#[test]
fn chunking_respects_configured_token_limit_and_emits_contiguous_ids() {
    let mut map = ConfigMap::new();
    map.insert("document_processing.enable_chunking".to_string(), "true".to_string());
    map.insert("chunking.chunk_token_limit".to_string(), "64".to_string());
    map.insert("chunking.chunk_min_content".to_string(), "10".to_string());
    map.insert("document_processing.quality_filtering.enabled".to_string(), "false".to_string());
    let engine = Engine::new(EngineConfig::from_map(&map).unwrap()).unwrap();

    let words: Vec<String> = (0..400).map(|i| format!("word{i}")).collect();
    let body = words.join(" ") + ".";
    let result = engine.chunk_text("doc-1", &body, "Title", &BTreeMap::new());

    assert!(result.total_chunks > 1);
    let ids: Vec<i64> = result.chunks.iter().map(|c| c.base.chunk_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(sorted, (0..ids.len() as i64).collect::<Vec<_>>());
}

#[test]
fn process_documents_parallel_handles_a_mixed_batch_without_losing_results() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut files = Vec::new();
    for i in 0..6 {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "{} Document number {i}.", long_quality_text()).unwrap();
        files.push(file);
    }
    let paths: Vec<_> = files.iter().map(|f| f.path().to_path_buf()).collect();
    let results = engine.process_documents_parallel(&paths).unwrap();
    assert_eq!(results.len(), paths.len());
    assert!(results.iter().all(|r| r.processing_success));
}

#[test]
fn process_documents_with_filtering_drops_low_quality_documents() {
    let mut map = ConfigMap::new();
    map.insert("document_processing.quality_filtering.min_content_length".to_string(), "1000".to_string());
    let engine = Engine::new(EngineConfig::from_map(&map).unwrap()).unwrap();

    let mut short = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
    writeln!(short, "short").unwrap();
    let paths = vec![short.path().to_path_buf()];

    let results = engine.process_documents_with_filtering(&paths).unwrap();
    assert!(results.is_empty());
}

#[test]
fn shutdown_is_idempotent_and_reported_via_status() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    engine.shutdown();
    engine.shutdown();
    assert_eq!(engine.status(), r3m::EngineStatus::Stopped);
}

#[test]
fn statistics_and_metrics_reflect_processed_documents() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let _ = engine.process_document_from_bytes("a.txt", long_quality_text().as_bytes()).unwrap();
    let _ = engine.process_document_from_bytes("b.txt", long_quality_text().as_bytes()).unwrap();

    let stats = engine.get_statistics();
    assert_eq!(stats.total_files_processed, 2);
    assert_eq!(stats.successful_processing, 2);

    let metrics = engine.get_metrics();
    assert_eq!(metrics.total_requests, 2);
    assert_eq!(metrics.successful_requests, 2);
}
