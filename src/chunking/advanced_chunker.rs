//! The orchestrator that turns a whole document into a `ChunkingResult`
//! (spec §4.5): metadata suffixes, title prefix, content budgeting, regular
//! chunking, optional mini-chunks/large-chunks/contextual-RAG, and quality
//! filtering.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::chunking::metadata::{self, MetadataResult};
use crate::chunking::models::{ChunkingResult, DocumentChunk, Section};
use crate::chunking::quality::QualityAssessor;
use crate::chunking::section_processor::{SectionProcessor, TokenManagementResult};
use crate::chunking::sentence_chunker::SentenceChunker;
use crate::tokenizer::{TokenCache, Tokenizer};

/// Tunables for [`AdvancedChunker`], mirroring `chunking.*` plus the
/// chunk-level quality thresholds reused from `document_processing.quality_filtering.*`.
#[derive(Debug, Clone)]
pub struct AdvancedChunkerConfig {
    pub chunk_token_limit: usize,
    pub chunk_min_content: usize,
    pub mini_chunk_size: usize,
    pub blurb_size: usize,
    pub large_chunk_ratio: usize,
    pub max_metadata_percentage: f64,
    pub contextual_rag_reserved_tokens: usize,
    pub enable_multipass: bool,
    pub enable_large_chunks: bool,
    pub enable_contextual_rag: bool,
    pub include_metadata: bool,

    pub enable_quality_filtering: bool,
    pub min_chunk_quality: f64,
    pub min_chunk_density: f64,
    pub min_chunk_length: usize,
    pub max_chunk_length: usize,
}

impl Default for AdvancedChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_token_limit: 2048,
            chunk_min_content: 256,
            mini_chunk_size: 150,
            blurb_size: 100,
            large_chunk_ratio: 4,
            max_metadata_percentage: 0.25,
            contextual_rag_reserved_tokens: 512,
            enable_multipass: false,
            enable_large_chunks: false,
            enable_contextual_rag: false,
            include_metadata: true,
            enable_quality_filtering: true,
            min_chunk_quality: 0.3,
            min_chunk_density: 0.1,
            min_chunk_length: 50,
            max_chunk_length: 1_000_000,
        }
    }
}

/// Produces document summaries and per-chunk context strings for the
/// contextual-RAG step. The default implementation is a deterministic
/// placeholder, not a call into any LLM — see spec §9's Open Question.
pub trait ContextualRagSummarizer: Send + Sync {
    fn summarize_document(&self, chunks: &[DocumentChunk]) -> String;
    fn chunk_context(&self, chunk: &DocumentChunk, doc_summary: &str) -> String;
}

/// Deterministic default: summarizes by chunk count and opening blurb,
/// contextualizes by echoing the document summary back onto each chunk.
pub struct PlaceholderSummarizer;

impl ContextualRagSummarizer for PlaceholderSummarizer {
    fn summarize_document(&self, chunks: &[DocumentChunk]) -> String {
        let opening = chunks.first().map(|c| c.base.blurb.as_str()).unwrap_or("");
        format!("Document summary ({} chunk(s)). Opens with: {}", chunks.len(), opening)
    }

    fn chunk_context(&self, _chunk: &DocumentChunk, doc_summary: &str) -> String {
        format!("[Context: {}]", doc_summary)
    }
}

pub struct AdvancedChunker {
    tokenizer: Arc<dyn Tokenizer>,
    quality_assessor: QualityAssessor,
    config: AdvancedChunkerConfig,
    summarizer: Arc<dyn ContextualRagSummarizer>,
}

impl AdvancedChunker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, quality_assessor: QualityAssessor, config: AdvancedChunkerConfig) -> Self {
        Self::with_summarizer(tokenizer, quality_assessor, config, Arc::new(PlaceholderSummarizer))
    }

    pub fn with_summarizer(
        tokenizer: Arc<dyn Tokenizer>,
        quality_assessor: QualityAssessor,
        config: AdvancedChunkerConfig,
        summarizer: Arc<dyn ContextualRagSummarizer>,
    ) -> Self {
        Self { tokenizer, quality_assessor, config, summarizer }
    }

    /// Chunks one document. `sections`, if given, overrides the single
    /// full-content section normally synthesized from `content`.
    #[tracing::instrument(skip_all, fields(document_id, content_len = content.len()))]
    pub fn chunk_document(
        &self,
        document_id: &str,
        content: &str,
        title: &str,
        metadata: &BTreeMap<String, String>,
        sections: Option<&[Section]>,
    ) -> ChunkingResult {
        let start = Instant::now();

        let has_sections = sections.map(|s| !s.is_empty()).unwrap_or(false);
        if content.trim().is_empty() && !has_sections {
            return ChunkingResult::default();
        }

        let mut cache = TokenCache::new(self.tokenizer.clone());

        // Step 1: metadata suffixes.
        let (mut semantic_suffix, mut keyword_suffix, mut metadata_tokens) = if self.config.include_metadata {
            let MetadataResult { semantic_suffix, keyword_suffix } = metadata::process_metadata(metadata);
            let metadata_tokens = cache.get_token_count(&semantic_suffix);
            (semantic_suffix, keyword_suffix, metadata_tokens)
        } else {
            (String::new(), String::new(), 0)
        };
        if metadata::is_metadata_too_large(metadata_tokens, self.config.chunk_token_limit, self.config.max_metadata_percentage) {
            semantic_suffix.clear();
            keyword_suffix.clear();
            metadata_tokens = 0;
        }

        // Step 2: title prefix.
        let title_prefix = if title.trim().is_empty() { String::new() } else { format!("{}\n", title) };
        let title_tokens = cache.get_token_count(&title_prefix);

        // Step 3: content token limit, floored to chunk_min_content by
        // zeroing metadata first if the floor would otherwise be missed.
        let rag_reserved = if self.config.enable_contextual_rag { self.config.contextual_rag_reserved_tokens } else { 0 };
        let mut content_token_limit = self
            .config
            .chunk_token_limit
            .saturating_sub(title_tokens + metadata_tokens + rag_reserved);
        if content_token_limit < self.config.chunk_min_content {
            semantic_suffix.clear();
            keyword_suffix.clear();
            metadata_tokens = 0;
            content_token_limit = self
                .config
                .chunk_token_limit
                .saturating_sub(title_tokens + rag_reserved)
                .max(self.config.chunk_min_content);
        }

        let tmr = TokenManagementResult {
            title_prefix: title_prefix.clone(),
            metadata_suffix_semantic: semantic_suffix.clone(),
            metadata_suffix_keyword: keyword_suffix.clone(),
            title_tokens,
            metadata_tokens,
            content_token_limit,
            contextual_rag_reserved_tokens: rag_reserved,
            document_id: document_id.to_string(),
            source_type: String::new(),
            semantic_identifier: title.to_string(),
        };

        // Step 4: regular chunks.
        let owned_sections;
        let sections_ref: &[Section] = match sections {
            Some(s) if !s.is_empty() => s,
            _ => {
                owned_sections = vec![Section::text(content, "")];
                &owned_sections
            }
        };
        let processor = SectionProcessor::new(self.tokenizer.clone(), self.quality_assessor.clone(), self.config.blurb_size);
        let mut regular_chunks = processor.process_sections(sections_ref, &tmr);

        let mut next_chunk_id = regular_chunks
            .iter()
            .map(|c| c.base.chunk_id)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);

        let mut all_chunks = regular_chunks.clone();

        // Step 5: mini-chunks.
        if self.config.enable_multipass {
            let mini_chunker = SentenceChunker::new(self.tokenizer.clone(), self.config.mini_chunk_size);
            for (i, chunk) in regular_chunks.iter_mut().enumerate() {
                let fragments = mini_chunker.chunk(&chunk.base.content);
                chunk.mini_chunk_texts = fragments.clone();
                all_chunks[i].mini_chunk_texts = fragments.clone();

                for fragment in fragments {
                    let mut mini = chunk.clone();
                    mini.base.chunk_id = next_chunk_id;
                    next_chunk_id += 1;
                    mini.base.content = fragment;
                    mini.base.blurb = crate::text::extract_blurb(&mini.base.content, self.config.blurb_size);
                    mini.mini_chunk_texts = Vec::new();
                    mini.large_chunk_id = Some(chunk.base.chunk_id);
                    mini.large_chunk_reference_ids = vec![chunk.base.chunk_id];
                    all_chunks.push(mini);
                }
            }
        }

        // Step 6: large chunks.
        if self.config.enable_large_chunks && !regular_chunks.is_empty() {
            let ratio = self.config.large_chunk_ratio.max(1);
            for group in regular_chunks.chunks(ratio) {
                let combined_content = group.iter().map(|c| c.base.content.as_str()).collect::<Vec<_>>().join("\n\n");
                let mut large = group[0].clone();
                let large_id = next_chunk_id;
                next_chunk_id += 1;
                large.base.chunk_id = large_id;
                large.base.content = combined_content;
                large.base.blurb = crate::text::extract_blurb(&large.base.content, self.config.blurb_size);
                let metrics = self.quality_assessor.assess_quality(&large.base.content);
                large.quality_score = metrics.content_quality_score;
                large.information_density = metrics.information_density;
                large.is_high_quality = metrics.is_high_quality;
                large.large_chunk_id = Some(large_id);
                large.large_chunk_reference_ids = group.iter().map(|c| c.base.chunk_id).collect();
                large.mini_chunk_texts = Vec::new();
                all_chunks.push(large);
            }
        }

        // Step 7: contextual RAG.
        if self.config.enable_contextual_rag {
            if regular_chunks.len() <= 1 {
                for c in all_chunks.iter_mut() {
                    c.contextual_rag_reserved_tokens = 0;
                    c.doc_summary.clear();
                    c.chunk_context.clear();
                }
            } else {
                let doc_summary = self.summarizer.summarize_document(&regular_chunks);
                for c in all_chunks.iter_mut() {
                    c.chunk_context = self.summarizer.chunk_context(c, &doc_summary);
                    c.doc_summary = doc_summary.clone();
                    c.contextual_rag_reserved_tokens = self.config.contextual_rag_reserved_tokens;
                }
            }
        }

        // Step 8: quality filtering.
        let before = all_chunks.len();
        if self.config.enable_quality_filtering {
            all_chunks.retain(|c| self.should_include_chunk(c));
        }
        let failed_chunks = before - all_chunks.len();

        // Step 9: aggregates.
        self.build_result(all_chunks, failed_chunks, &tmr, start)
    }

    fn should_include_chunk(&self, chunk: &DocumentChunk) -> bool {
        let len = chunk.base.content.chars().count();
        chunk.quality_score >= self.config.min_chunk_quality
            && chunk.information_density >= self.config.min_chunk_density
            && len >= self.config.min_chunk_length
            && len <= self.config.max_chunk_length
    }

    fn build_result(
        &self,
        chunks: Vec<DocumentChunk>,
        failed_chunks: usize,
        tmr: &TokenManagementResult,
        start: Instant,
    ) -> ChunkingResult {
        let total_chunks = chunks.len();
        let high_quality_chunks = chunks.iter().filter(|c| c.is_high_quality).count();

        let (quality_sum, density_sum) = chunks
            .iter()
            .fold((0.0, 0.0), |(q, d), c| (q + c.quality_score, d + c.information_density));

        let avg_quality_score = if total_chunks > 0 { quality_sum / total_chunks as f64 } else { 0.0 };
        let avg_information_density = if total_chunks > 0 { density_sum / total_chunks as f64 } else { 0.0 };

        let total_content_tokens: usize = chunks
            .iter()
            .map(|c| {
                let mut cache = TokenCache::new(self.tokenizer.clone());
                cache.get_token_count(&c.base.content)
            })
            .sum();
        let total_rag_tokens: usize = chunks.iter().map(|c| c.contextual_rag_reserved_tokens).sum();

        ChunkingResult {
            total_chunks,
            successful_chunks: total_chunks,
            failed_chunks,
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            avg_quality_score,
            avg_information_density,
            high_quality_chunks,
            total_title_tokens: tmr.title_tokens * total_chunks.min(1),
            total_metadata_tokens: tmr.metadata_tokens * total_chunks.min(1),
            total_content_tokens,
            total_rag_tokens,
            chunks,
        }
    }
}
