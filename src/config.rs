//! Effective-configuration parsing.
//!
//! The engine is configured by a flat map of dotted string keys to string
//! values (see the configuration key table in the spec). Loading that map
//! from a file is explicitly out of scope here; callers build the map
//! however they like and hand it to [`crate::Engine::new`].

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A flat effective-configuration map. Unrecognized keys are ignored.
pub type ConfigMap = BTreeMap<String, String>;

fn get<'a>(map: &'a ConfigMap, key: &str) -> Option<&'a str> {
    map.get(key).map(|s| s.as_str())
}

fn get_parsed<T: std::str::FromStr>(map: &ConfigMap, key: &str, default: T) -> T {
    get(map, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_bool(map: &ConfigMap, key: &str, default: bool) -> bool {
    get(map, key)
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn get_string(map: &ConfigMap, key: &str, default: &str) -> String {
    get(map, key).map(|s| s.to_string()).unwrap_or_else(|| default.to_string())
}

/// Parses a byte-size value that may carry a `<N>MB`/`<N>KB` suffix, falling
/// back to a plain integer count of bytes.
fn parse_byte_size(raw: &str, default: usize) -> usize {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(num) = upper.strip_suffix("MB") {
        return num.trim().parse::<usize>().map(|n| n * 1024 * 1024).unwrap_or(default);
    }
    if let Some(num) = upper.strip_suffix("KB") {
        return num.trim().parse::<usize>().map(|n| n * 1024).unwrap_or(default);
    }
    trimmed.parse::<usize>().unwrap_or(default)
}

/// Text-processing sub-options under `document_processing.text_processing.*`.
#[derive(Debug, Clone)]
pub struct TextProcessingConfig {
    pub encoding_detection: bool,
    pub default_encoding: String,
    pub remove_html_tags: bool,
    pub normalize_whitespace: bool,
    pub extract_metadata: bool,
}

impl Default for TextProcessingConfig {
    fn default() -> Self {
        Self {
            encoding_detection: true,
            default_encoding: "utf-8".to_string(),
            remove_html_tags: true,
            normalize_whitespace: true,
            extract_metadata: true,
        }
    }
}

/// Quality-filtering sub-options under `document_processing.quality_filtering.*`.
#[derive(Debug, Clone)]
pub struct QualityFilteringConfig {
    pub enabled: bool,
    pub min_content_quality_score: f64,
    pub min_information_density: f64,
    pub min_content_length: usize,
    pub max_content_length: usize,
    pub filter_empty_documents: bool,
    pub filter_low_quality_documents: bool,
}

impl Default for QualityFilteringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_content_quality_score: 0.3,
            min_information_density: 0.1,
            min_content_length: 50,
            max_content_length: 1_000_000,
            filter_empty_documents: true,
            filter_low_quality_documents: true,
        }
    }
}

/// Top-level document-processing options.
#[derive(Debug, Clone)]
pub struct DocumentProcessingConfig {
    pub max_file_size: usize,
    pub max_text_length: usize,
    pub batch_size: usize,
    pub max_workers: usize,
    pub enable_chunking: bool,
    /// Advisory per-document processing budget. `0` disables the check. A
    /// document that runs past this is still completed in full — it is only
    /// flagged via `DocumentResult::timed_out`, never aborted mid-flight
    /// (spec §4.6: "the task still runs but its `DocumentResult` is flagged
    /// as timed out").
    pub soft_timeout_ms: u64,
    pub text_processing: TextProcessingConfig,
    pub quality_filtering: QualityFilteringConfig,
}

impl Default for DocumentProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_text_length: 1_000_000,
            batch_size: 16,
            max_workers: num_cpus::get().max(4),
            enable_chunking: false,
            soft_timeout_ms: 0,
            text_processing: TextProcessingConfig::default(),
            quality_filtering: QualityFilteringConfig::default(),
        }
    }
}

/// `chunking.*` options, mirrored closely by [`crate::chunking::AdvancedChunkerConfig`].
#[derive(Debug, Clone)]
pub struct ChunkingSectionConfig {
    pub chunk_token_limit: usize,
    pub chunk_overlap: usize,
    pub mini_chunk_size: usize,
    pub blurb_size: usize,
    pub large_chunk_ratio: usize,
    pub chunk_min_content: usize,
    pub max_metadata_percentage: f64,
    pub contextual_rag_reserved_tokens: usize,
    pub enable_multipass: bool,
    pub enable_large_chunks: bool,
    pub enable_contextual_rag: bool,
    pub include_metadata: bool,
}

impl Default for ChunkingSectionConfig {
    fn default() -> Self {
        Self {
            chunk_token_limit: 2048,
            chunk_overlap: 0,
            mini_chunk_size: 150,
            blurb_size: 100,
            large_chunk_ratio: 4,
            chunk_min_content: 256,
            max_metadata_percentage: 0.25,
            contextual_rag_reserved_tokens: 512,
            enable_multipass: false,
            enable_large_chunks: false,
            enable_contextual_rag: false,
            include_metadata: true,
        }
    }
}

/// The fully-parsed effective configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub document_processing: DocumentProcessingConfig,
    pub chunking: ChunkingSectionConfig,
}

impl EngineConfig {
    /// Parse an effective-configuration map into typed config, applying
    /// every default from the spec's configuration key table for keys that
    /// are absent or unparsable.
    pub fn from_map(map: &ConfigMap) -> Result<Self> {
        let defaults = Self::default();

        let max_file_size = get(map, "document_processing.max_file_size")
            .map(|raw| parse_byte_size(raw, defaults.document_processing.max_file_size))
            .unwrap_or(defaults.document_processing.max_file_size);

        let document_processing = DocumentProcessingConfig {
            max_file_size,
            max_text_length: get_parsed(map, "document_processing.max_text_length", defaults.document_processing.max_text_length),
            batch_size: get_parsed(map, "document_processing.batch_size", defaults.document_processing.batch_size),
            max_workers: get_parsed(map, "document_processing.max_workers", defaults.document_processing.max_workers),
            enable_chunking: get_bool(map, "document_processing.enable_chunking", defaults.document_processing.enable_chunking),
            soft_timeout_ms: get_parsed(map, "document_processing.soft_timeout_ms", defaults.document_processing.soft_timeout_ms),
            text_processing: TextProcessingConfig {
                encoding_detection: get_bool(map, "document_processing.text_processing.encoding_detection", true),
                default_encoding: get_string(map, "document_processing.text_processing.default_encoding", "utf-8"),
                remove_html_tags: get_bool(map, "document_processing.text_processing.remove_html_tags", true),
                normalize_whitespace: get_bool(map, "document_processing.text_processing.normalize_whitespace", true),
                extract_metadata: get_bool(map, "document_processing.text_processing.extract_metadata", true),
            },
            quality_filtering: QualityFilteringConfig {
                enabled: get_bool(map, "document_processing.quality_filtering.enabled", true),
                min_content_quality_score: get_parsed(map, "document_processing.quality_filtering.min_content_quality_score", 0.3),
                min_information_density: get_parsed(map, "document_processing.quality_filtering.min_information_density", 0.1),
                min_content_length: get_parsed(map, "document_processing.quality_filtering.min_content_length", 50),
                max_content_length: get_parsed(map, "document_processing.quality_filtering.max_content_length", 1_000_000),
                filter_empty_documents: get_bool(map, "document_processing.quality_filtering.filter_empty_documents", true),
                filter_low_quality_documents: get_bool(map, "document_processing.quality_filtering.filter_low_quality_documents", true),
            },
        };

        let chunking = ChunkingSectionConfig {
            chunk_token_limit: get_parsed(map, "chunking.chunk_token_limit", defaults.chunking.chunk_token_limit),
            chunk_overlap: get_parsed(map, "chunking.chunk_overlap", defaults.chunking.chunk_overlap),
            mini_chunk_size: get_parsed(map, "chunking.mini_chunk_size", defaults.chunking.mini_chunk_size),
            blurb_size: get_parsed(map, "chunking.blurb_size", defaults.chunking.blurb_size),
            large_chunk_ratio: get_parsed(map, "chunking.large_chunk_ratio", defaults.chunking.large_chunk_ratio),
            chunk_min_content: get_parsed(map, "chunking.chunk_min_content", defaults.chunking.chunk_min_content),
            max_metadata_percentage: get_parsed(map, "chunking.max_metadata_percentage", defaults.chunking.max_metadata_percentage),
            contextual_rag_reserved_tokens: get_parsed(map, "chunking.contextual_rag_reserved_tokens", defaults.chunking.contextual_rag_reserved_tokens),
            enable_multipass: get_bool(map, "chunking.enable_multipass", false),
            enable_large_chunks: get_bool(map, "chunking.enable_large_chunks", false),
            enable_contextual_rag: get_bool(map, "chunking.enable_contextual_rag", false),
            include_metadata: get_bool(map, "chunking.include_metadata", true),
        };

        if chunking.chunk_token_limit == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_token_limit must be > 0".to_string()));
        }

        Ok(Self { document_processing, chunking })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = EngineConfig::from_map(&ConfigMap::new()).unwrap();
        assert_eq!(cfg.document_processing.max_file_size, 100 * 1024 * 1024);
        assert_eq!(cfg.document_processing.batch_size, 16);
        assert_eq!(cfg.chunking.chunk_token_limit, 2048);
        assert_eq!(cfg.chunking.chunk_min_content, 256);
        assert_eq!(cfg.chunking.max_metadata_percentage, 0.25);
        assert_eq!(cfg.chunking.contextual_rag_reserved_tokens, 512);
    }

    #[test]
    fn parses_mb_suffix() {
        let mut map = ConfigMap::new();
        map.insert("document_processing.max_file_size".to_string(), "50MB".to_string());
        let cfg = EngineConfig::from_map(&map).unwrap();
        assert_eq!(cfg.document_processing.max_file_size, 50 * 1024 * 1024);
    }

    #[test]
    fn rejects_zero_chunk_token_limit() {
        let mut map = ConfigMap::new();
        map.insert("chunking.chunk_token_limit".to_string(), "0".to_string());
        assert!(EngineConfig::from_map(&map).is_err());
    }
}
