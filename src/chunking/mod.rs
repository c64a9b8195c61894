//! Document chunking: tokenized sections, quality scoring, and the
//! orchestrator that turns a whole document into scored, bounded chunks.

mod advanced_chunker;
mod metadata;
mod models;
mod quality;
mod section_processor;
mod sentence_chunker;

pub use advanced_chunker::{AdvancedChunker, AdvancedChunkerConfig, ContextualRagSummarizer, PlaceholderSummarizer};
pub use metadata::{clean_metadata_value, is_metadata_too_large, process_metadata, MetadataResult};
pub use models::{
    BaseChunk, ChunkingResult, DocumentChunk, Section, CHUNK_MIN_CONTENT, CHUNK_OVERLAP,
    DEFAULT_CONTEXTUAL_RAG_RESERVED_TOKENS, MAX_METADATA_PERCENTAGE, STRICT_CHUNK_TOKEN_LIMIT,
};
pub use quality::{QualityAssessor, QualityConfig, QualityMetrics};
pub use section_processor::{SectionProcessor, TokenManagementResult};
pub use sentence_chunker::SentenceChunker;
