//! Content-quality and information-density scoring (spec §4.4).
//!
//! This is the single, canonical scorer used for both whole-document
//! filtering and per-chunk scoring — see `SPEC_FULL.md` §4.4 for why the
//! original source's cheaper internal shortcuts were not carried forward.

use std::collections::HashSet;

use crate::simd;

/// Configurable weights/norms for [`QualityAssessor`], matching the
/// `document_processing.quality_filtering.*` defaults.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    pub length_weight: f64,
    pub word_diversity_weight: f64,
    pub sentence_structure_weight: f64,
    pub info_density_weight: f64,

    pub length_normalization: f64,
    pub word_diversity_normalization: f64,
    pub sentence_normalization: f64,

    pub unique_word_ratio_weight: f64,
    pub technical_term_density_weight: f64,
    pub sentence_complexity_weight: f64,
    pub technical_term_normalization: f64,
    pub sentence_complexity_normalization: f64,

    pub min_content_quality_score: f64,
    pub min_information_density: f64,
    pub min_content_length: usize,
    pub max_content_length: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            length_weight: 0.3,
            word_diversity_weight: 0.3,
            sentence_structure_weight: 0.2,
            info_density_weight: 0.2,

            length_normalization: 1000.0,
            // Intentionally reused below for information_density too — see
            // spec §9's Open Question; preserved verbatim.
            word_diversity_normalization: 5.0,
            sentence_normalization: 10.0,

            unique_word_ratio_weight: 0.4,
            technical_term_density_weight: 0.3,
            sentence_complexity_weight: 0.3,
            technical_term_normalization: 10.0,
            sentence_complexity_normalization: 100.0,

            min_content_quality_score: 0.3,
            min_information_density: 0.1,
            min_content_length: 50,
            max_content_length: 1_000_000,
        }
    }
}

/// The computed scores and pass/fail verdict for one fragment of text.
#[derive(Debug, Clone, Default)]
pub struct QualityMetrics {
    pub text_length: usize,
    pub unique_words: usize,
    pub sentence_count: usize,
    pub technical_terms: usize,
    pub content_quality_score: f64,
    pub information_density: f64,
    pub is_high_quality: bool,
    pub quality_reason: String,
}

#[derive(Clone)]
pub struct QualityAssessor {
    config: QualityConfig,
}

impl QualityAssessor {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    fn unique_words(text: &str) -> HashSet<String> {
        text.split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }

    fn is_technical_word(word: &str) -> bool {
        word.chars().any(|c| c.is_ascii_digit())
            || word.contains(['_', '-', '.', '#', '@'])
    }

    fn count_technical_terms(text: &str) -> usize {
        text.split_whitespace().filter(|w| Self::is_technical_word(w)).count()
    }

    fn count_sentences(text: &str) -> usize {
        simd::count_char_dispatch(text, b'.')
            + simd::count_char_dispatch(text, b'!')
            + simd::count_char_dispatch(text, b'?')
    }

    fn average_sentence_length_chars(text: &str, sentence_count: usize) -> f64 {
        if sentence_count == 0 {
            return text.len() as f64;
        }
        text.len() as f64 / sentence_count as f64
    }

    fn content_quality_score(&self, text: &str, unique_words: usize, sentence_count: usize) -> f64 {
        let cfg = &self.config;
        let length = text.len() as f64;

        let length_factor = (length / cfg.length_normalization).min(1.0);
        let diversity_denom = (length / cfg.word_diversity_normalization).max(1.0);
        let diversity_factor = (unique_words as f64 / diversity_denom).min(1.0);
        let sentence_factor = (sentence_count as f64 / cfg.sentence_normalization).min(1.0);
        let info_density = self.information_density(text, unique_words, sentence_count);

        length_factor * cfg.length_weight
            + diversity_factor * cfg.word_diversity_weight
            + sentence_factor * cfg.sentence_structure_weight
            + info_density * cfg.info_density_weight
    }

    fn information_density(&self, text: &str, unique_words: usize, sentence_count: usize) -> f64 {
        let cfg = &self.config;
        let length = text.len() as f64;

        let diversity_denom = (length / cfg.word_diversity_normalization).max(1.0);
        let unique_ratio = (unique_words as f64 / diversity_denom).min(1.0);

        let technical_terms = Self::count_technical_terms(text) as f64;
        let tech_denom = (length / cfg.technical_term_normalization).max(1.0);
        let tech_density = (technical_terms / tech_denom).min(1.0);

        let avg_sentence_len = Self::average_sentence_length_chars(text, sentence_count);
        let complexity = (avg_sentence_len / cfg.sentence_complexity_normalization).min(1.0);

        unique_ratio * cfg.unique_word_ratio_weight
            + tech_density * cfg.technical_term_density_weight
            + complexity * cfg.sentence_complexity_weight
    }

    fn determine_quality_reason(&self, metrics: &QualityMetrics) -> String {
        let cfg = &self.config;
        if metrics.text_length < cfg.min_content_length {
            "Content too short".to_string()
        } else if metrics.content_quality_score < cfg.min_content_quality_score {
            "Low content quality score".to_string()
        } else if metrics.information_density < cfg.min_information_density {
            "Low information density".to_string()
        } else if metrics.text_length > cfg.max_content_length {
            "Quality assessment failed".to_string()
        } else {
            "High quality content".to_string()
        }
    }

    /// Assesses `text` and returns its full [`QualityMetrics`].
    pub fn assess_quality(&self, text: &str) -> QualityMetrics {
        let unique_words_set = Self::unique_words(text);
        let sentence_count = Self::count_sentences(text);
        let technical_terms = Self::count_technical_terms(text);

        let content_quality_score = self.content_quality_score(text, unique_words_set.len(), sentence_count);
        let information_density = self.information_density(text, unique_words_set.len(), sentence_count);

        let mut metrics = QualityMetrics {
            text_length: text.len(),
            unique_words: unique_words_set.len(),
            sentence_count,
            technical_terms,
            content_quality_score,
            information_density,
            is_high_quality: false,
            quality_reason: String::new(),
        };

        metrics.is_high_quality = self.is_high_quality_content(&metrics);
        metrics.quality_reason = self.determine_quality_reason(&metrics);
        metrics
    }

    fn is_high_quality_content(&self, metrics: &QualityMetrics) -> bool {
        let cfg = &self.config;
        metrics.content_quality_score >= cfg.min_content_quality_score
            && metrics.information_density >= cfg.min_information_density
            && metrics.text_length >= cfg.min_content_length
            && metrics.text_length <= cfg.max_content_length
    }
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_bounded_zero_to_one() {
        let assessor = QualityAssessor::default();
        let text = "The quick brown fox jumps over the lazy dog. It happened near v2.1 of the api_key.";
        let metrics = assessor.assess_quality(text);
        assert!((0.0..=1.0).contains(&metrics.content_quality_score));
        assert!((0.0..=1.0).contains(&metrics.information_density));
    }

    #[test]
    fn scenario_s1_empty_text_reason_is_content_too_short() {
        let assessor = QualityAssessor::default();
        let metrics = assessor.assess_quality("");
        assert!(!metrics.is_high_quality);
        assert_eq!(metrics.quality_reason, "Content too short");
    }

    #[test]
    fn high_quality_long_varied_text_passes() {
        let assessor = QualityAssessor::default();
        let text = "Rust ownership and borrowing rules enforce memory safety without a garbage collector. \
            The borrow checker analyzes lifetimes at compile time, rejecting data races and use-after-free bugs. \
            This is fundamentally different from languages relying on runtime reference counting or tracing GC, \
            and it lets systems programmers write concurrent code with confidence.".repeat(2);
        let metrics = assessor.assess_quality(&text);
        assert_eq!(metrics.quality_reason, "High quality content");
        assert!(metrics.is_high_quality);
    }
}
