//! Core chunking data types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token-management constants that must be bit-exact with the spec.
pub const MAX_METADATA_PERCENTAGE: f64 = 0.25;
pub const CHUNK_MIN_CONTENT: usize = 256;
pub const CHUNK_OVERLAP: usize = 0;
pub const DEFAULT_CONTEXTUAL_RAG_RESERVED_TOKENS: usize = 512;
pub const STRICT_CHUNK_TOKEN_LIMIT: bool = true;

/// The pre-structure unit of a document; multiple sections concatenate to
/// form the document body. Images force their own chunk.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub content: String,
    pub link: String,
    pub is_image: bool,
    pub image_file_id: String,
    pub token_count: usize,
}

impl Section {
    pub fn text(content: impl Into<String>, link: impl Into<String>) -> Self {
        Self { content: content.into(), link: link.into(), ..Default::default() }
    }

    pub fn image(link: impl Into<String>, image_file_id: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            is_image: true,
            image_file_id: image_file_id.into(),
            ..Default::default()
        }
    }
}

/// Fundamental chunk properties shared by every emitted chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseChunk {
    pub chunk_id: i64,
    /// First sentence(s) of `content` (≤100 chars by default).
    pub blurb: String,
    pub content: String,
    /// Maps byte offsets within `content` to the source link active there.
    pub source_links: HashMap<usize, String>,
    pub image_file_id: String,
    /// True when this chunk does not start at a section boundary.
    pub section_continuation: bool,
}

/// A document-aware chunk with metadata, multipass, contextual-RAG, and
/// quality fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentChunk {
    #[serde(flatten)]
    pub base: BaseChunk,

    pub document_id: String,
    pub title_prefix: String,
    pub metadata_suffix_semantic: String,
    pub metadata_suffix_keyword: String,

    pub title_tokens: usize,
    pub metadata_tokens: usize,
    pub content_token_limit: usize,

    pub mini_chunk_texts: Vec<String>,
    pub large_chunk_id: Option<i64>,
    pub large_chunk_reference_ids: Vec<i64>,

    pub contextual_rag_reserved_tokens: usize,
    pub doc_summary: String,
    pub chunk_context: String,

    pub quality_score: f64,
    pub information_density: f64,
    pub is_high_quality: bool,

    pub source_type: String,
    pub semantic_identifier: String,
}

impl DocumentChunk {
    pub fn to_short_descriptor(&self) -> String {
        format!("{} Chunk ID: {}", self.document_id, self.base.chunk_id)
    }

    pub fn get_primary_link(&self) -> String {
        self.base.source_links.get(&0).cloned().unwrap_or_default()
    }

    /// Full content with title and metadata, for indexing.
    pub fn get_full_content(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.title_prefix, self.doc_summary, self.base.content, self.chunk_context, self.metadata_suffix_keyword
        )
    }

    /// Content summary without title/metadata, for highlighting.
    pub fn get_content_summary(&self) -> String {
        self.base.content.clone()
    }
}

/// The result of chunking a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<DocumentChunk>,
    pub total_chunks: usize,
    pub successful_chunks: usize,
    pub failed_chunks: usize,
    pub processing_time_ms: f64,

    pub avg_quality_score: f64,
    pub avg_information_density: f64,
    pub high_quality_chunks: usize,

    pub total_title_tokens: usize,
    pub total_metadata_tokens: usize,
    pub total_content_tokens: usize,
    pub total_rag_tokens: usize,
}
