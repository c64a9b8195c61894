//! Section processor: the core of the chunking engine (spec §4.3).

use std::sync::Arc;

use crate::chunking::models::{BaseChunk, DocumentChunk, Section};
use crate::chunking::quality::QualityAssessor;
use crate::chunking::sentence_chunker::SentenceChunker;
use crate::text::{self, SECTION_SEPARATOR};
use crate::tokenizer::{TokenCache, Tokenizer};

/// Everything the section processor needs beyond the raw sections:
/// precomputed title/metadata prefixes and the content budget they leave
/// behind.
#[derive(Debug, Clone, Default)]
pub struct TokenManagementResult {
    pub title_prefix: String,
    pub metadata_suffix_semantic: String,
    pub metadata_suffix_keyword: String,
    pub title_tokens: usize,
    pub metadata_tokens: usize,
    pub content_token_limit: usize,
    pub contextual_rag_reserved_tokens: usize,
    pub document_id: String,
    pub source_type: String,
    pub semantic_identifier: String,
}

pub struct SectionProcessor {
    tokenizer: Arc<dyn Tokenizer>,
    quality_assessor: QualityAssessor,
    blurb_size: usize,
    strict_chunk_token_limit: bool,
}

/// Accumulates an in-flight chunk's buffer and source links before it is
/// finalized into a `DocumentChunk`.
struct InFlightChunk {
    content: String,
    source_links: std::collections::HashMap<usize, String>,
    section_continuation: bool,
}

impl InFlightChunk {
    fn empty(section_continuation: bool) -> Self {
        Self { content: String::new(), source_links: Default::default(), section_continuation }
    }

    fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl SectionProcessor {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, quality_assessor: QualityAssessor, blurb_size: usize) -> Self {
        Self { tokenizer, quality_assessor, blurb_size, strict_chunk_token_limit: true }
    }

    /// Transforms `sections` plus `tmr` into a vector of `DocumentChunk`s,
    /// following the per-section decision tree in spec §4.3.
    pub fn process_sections(&self, sections: &[Section], tmr: &TokenManagementResult) -> Vec<DocumentChunk> {
        let mut cache = TokenCache::new(self.tokenizer.clone());

        // Preprocessing: clean each section's content and precompute its
        // token count into parallel vectors, avoiding recomputation.
        let cleaned: Vec<String> = sections.iter().map(|s| text::clean_text(&s.content)).collect();
        let token_counts: Vec<usize> = cleaned.iter().map(|c| cache.get_token_count(c)).collect();

        let mut chunks = Vec::new();
        let mut next_chunk_id: i64 = 0;
        let mut in_flight = InFlightChunk::empty(false);

        let separator_tokens = cache.get_token_count(SECTION_SEPARATOR);

        for (i, section) in sections.iter().enumerate() {
            if section.is_image {
                // Case 1: image section.
                if !in_flight.is_empty() {
                    chunks.push(self.finalize(&mut in_flight, &mut next_chunk_id, tmr, &mut cache));
                }
                let mut image_chunk = InFlightChunk::empty(false);
                image_chunk.source_links.insert(0, section.link.clone());
                let mut chunk = self.finalize(&mut image_chunk, &mut next_chunk_id, tmr, &mut cache);
                chunk.base.image_file_id = section.image_file_id.clone();
                chunks.push(chunk);
                continue;
            }

            let section_tokens = token_counts[i];
            let section_text = &cleaned[i];

            if section_tokens > tmr.content_token_limit {
                // Case 2: oversized text section.
                if !in_flight.is_empty() {
                    chunks.push(self.finalize(&mut in_flight, &mut next_chunk_id, tmr, &mut cache));
                }
                let splits = self.split_oversized_section(section_text, tmr.content_token_limit, &mut cache);
                for (split_index, split) in splits.into_iter().enumerate() {
                    let mut split_chunk = InFlightChunk::empty(split_index > 0);
                    split_chunk.content = split;
                    split_chunk.source_links.insert(0, section.link.clone());
                    chunks.push(self.finalize(&mut split_chunk, &mut next_chunk_id, tmr, &mut cache));
                }
                continue;
            }

            // Case 3: combinable text section.
            let current_token_count = cache.get_token_count(&in_flight.content);
            let next_cost = separator_tokens + section_tokens;

            if !in_flight.is_empty() && current_token_count + next_cost <= tmr.content_token_limit {
                let current_offset = text::shared_precompare_cleanup(&in_flight.content).len();
                in_flight.content.push_str(SECTION_SEPARATOR);
                in_flight.content.push_str(section_text);
                in_flight.source_links.insert(current_offset, section.link.clone());
            } else if in_flight.is_empty() {
                in_flight.content.push_str(section_text);
                in_flight.source_links.insert(0, section.link.clone());
            } else {
                chunks.push(self.finalize(&mut in_flight, &mut next_chunk_id, tmr, &mut cache));
                in_flight = InFlightChunk::empty(false);
                in_flight.content.push_str(section_text);
                in_flight.source_links.insert(0, section.link.clone());
            }
        }

        if !in_flight.is_empty() || chunks.is_empty() {
            chunks.push(self.finalize(&mut in_flight, &mut next_chunk_id, tmr, &mut cache));
        }

        chunks
    }

    /// Splits an oversized section using the sentence chunker, then
    /// re-checks each split; any split still over the limit is forced
    /// through the tokenize-and-regroup fallback.
    fn split_oversized_section(&self, text: &str, content_token_limit: usize, cache: &mut TokenCache) -> Vec<String> {
        let chunker = SentenceChunker::new(self.tokenizer.clone(), content_token_limit);
        let splits = chunker.chunk(text);

        let mut result = Vec::new();
        for split in splits {
            if self.strict_chunk_token_limit && cache.get_token_count(&split) > content_token_limit {
                result.extend(self.tokenize_and_regroup(&split, content_token_limit));
            } else {
                result.push(split);
            }
        }
        if result.is_empty() {
            result = self.tokenize_and_regroup(text, content_token_limit);
        }
        result
    }

    /// Tokenizes `text` directly and packs `content_token_limit` tokens at
    /// a time into output strings joined by single spaces. Guarantees
    /// strict bounds regardless of sentence structure.
    fn tokenize_and_regroup(&self, text: &str, content_token_limit: usize) -> Vec<String> {
        if content_token_limit == 0 {
            return vec![text.to_string()];
        }
        let tokens = self.tokenizer.tokenize(text);
        tokens
            .chunks(content_token_limit)
            .map(|chunk| chunk.join(" "))
            .collect()
    }

    fn finalize(
        &self,
        in_flight: &mut InFlightChunk,
        next_chunk_id: &mut i64,
        tmr: &TokenManagementResult,
        cache: &mut TokenCache,
    ) -> DocumentChunk {
        let content = std::mem::take(&mut in_flight.content);
        let source_links = std::mem::take(&mut in_flight.source_links);
        let section_continuation = in_flight.section_continuation;

        let metrics = self.quality_assessor.assess_quality(&content);
        let blurb = text::extract_blurb(&content, self.blurb_size);
        let _ = cache.get_token_count(&content);

        let chunk_id = *next_chunk_id;
        *next_chunk_id += 1;

        DocumentChunk {
            base: BaseChunk {
                chunk_id,
                blurb,
                content,
                source_links,
                image_file_id: String::new(),
                section_continuation,
            },
            document_id: tmr.document_id.clone(),
            title_prefix: tmr.title_prefix.clone(),
            metadata_suffix_semantic: tmr.metadata_suffix_semantic.clone(),
            metadata_suffix_keyword: tmr.metadata_suffix_keyword.clone(),
            title_tokens: tmr.title_tokens,
            metadata_tokens: tmr.metadata_tokens,
            content_token_limit: tmr.content_token_limit,
            mini_chunk_texts: Vec::new(),
            large_chunk_id: None,
            large_chunk_reference_ids: Vec::new(),
            contextual_rag_reserved_tokens: 0,
            doc_summary: String::new(),
            chunk_context: String::new(),
            quality_score: metrics.content_quality_score,
            information_density: metrics.information_density,
            is_high_quality: metrics.is_high_quality,
            source_type: tmr.source_type.clone(),
            semantic_identifier: tmr.semantic_identifier.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::BasicTokenizer;

    fn processor(content_token_limit: usize) -> (SectionProcessor, TokenManagementResult) {
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(BasicTokenizer::new(8192));
        let processor = SectionProcessor::new(tokenizer, QualityAssessor::default(), 100);
        let tmr = TokenManagementResult {
            content_token_limit,
            document_id: "doc-1".to_string(),
            ..Default::default()
        };
        (processor, tmr)
    }

    #[test]
    fn combines_small_sections_into_one_chunk() {
        let (processor, tmr) = processor(1000);
        let sections = vec![
            Section::text("Hello world.", "link-a"),
            Section::text("More text here.", "link-b"),
        ];
        let chunks = processor.process_sections(&sections, &tmr);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].base.content.contains("Hello world."));
        assert!(chunks[0].base.content.contains("More text here."));
        assert_eq!(chunks[0].base.source_links.get(&0).unwrap(), "link-a");
    }

    #[test]
    fn image_section_gets_its_own_chunk() {
        let (processor, tmr) = processor(1000);
        let sections = vec![
            Section::text("Some text.", "link-a"),
            Section::image("link-b", "img-1"),
        ];
        let chunks = processor.process_sections(&sections, &tmr);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].base.image_file_id, "img-1");
        assert!(!chunks[0].base.section_continuation);
    }

    #[test]
    fn oversized_section_splits_and_marks_continuation() {
        let (processor, tmr) = processor(5);
        let words: Vec<String> = (0..50).map(|i| format!("word{}", i)).collect();
        let sections = vec![Section::text(words.join(" "), "link-a")];
        let chunks = processor.process_sections(&sections, &tmr);
        assert!(chunks.len() > 1);
        assert!(!chunks[0].base.section_continuation);
        assert!(chunks[1].base.section_continuation);
    }

    #[test]
    fn chunk_ids_are_contiguous_from_zero() {
        let (processor, tmr) = processor(5);
        let words: Vec<String> = (0..50).map(|i| format!("word{}", i)).collect();
        let sections = vec![Section::text(words.join(" "), "link-a")];
        let chunks = processor.process_sections(&sections, &tmr);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.base.chunk_id, i as i64);
        }
    }

    #[test]
    fn guarantees_at_least_one_chunk_for_sections() {
        let (processor, tmr) = processor(1000);
        let sections = vec![Section::text("", "link-a")];
        let chunks = processor.process_sections(&sections, &tmr);
        assert_eq!(chunks.len(), 1);
    }
}
