//! Sentence-boundary-respecting chunker (spec §4.2).

use std::sync::Arc;

use crate::tokenizer::Tokenizer;

/// Abbreviations that do not terminate a sentence when they precede a
/// `.`/`!`/`?`.
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Sr", "Jr", "St", "Ave", "Blvd", "Rd", "Ln", "Ct", "Pl",
    "etc", "vs", "i.e", "e.g", "a.m", "p.m",
];

pub struct SentenceChunker {
    tokenizer: Arc<dyn Tokenizer>,
    chunk_size: usize,
    #[allow(dead_code)]
    chunk_overlap: usize,
}

impl SentenceChunker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, chunk_size: usize) -> Self {
        Self { tokenizer, chunk_size, chunk_overlap: 0 }
    }

    /// Splits `text` into sentences, then merges them into chunks of at
    /// most `chunk_size` tokens each.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = Self::split_into_sentences(text);
        self.merge_sentences_into_chunks(&sentences)
    }

    fn split_into_sentences(text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut current = String::new();

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            current.push(c);

            if c == '.' || c == '!' || c == '?' {
                if !Self::ends_with_abbreviation(&current) {
                    sentences.push(Self::clean_sentence(&current));
                    current.clear();
                }
            }
            i += 1;
        }
        if !current.trim().is_empty() {
            sentences.push(Self::clean_sentence(&current));
        }
        sentences.into_iter().filter(|s| !s.is_empty()).collect()
    }

    fn ends_with_abbreviation(current: &str) -> bool {
        let trimmed = current.trim_end_matches(['.', '!', '?']);
        let last_word = trimmed.rsplit(|c: char| c.is_whitespace()).next().unwrap_or("");
        ABBREVIATIONS.iter().any(|abbr| last_word.eq_ignore_ascii_case(abbr))
    }

    fn clean_sentence(sentence: &str) -> String {
        crate::text::normalize_whitespace(sentence)
    }

    fn merge_sentences_into_chunks(&self, sentences: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in sentences {
            let candidate = if current.is_empty() {
                sentence.clone()
            } else {
                format!("{} {}", current, sentence)
            };

            if !current.is_empty() && self.tokenizer.count_tokens(&candidate) > self.chunk_size {
                chunks.push(current);
                current = sentence.clone();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}
