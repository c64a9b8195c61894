//! Byte-pair-encoding tokenizer with an in-memory, trainable vocabulary.
//!
//! Grounded on the chunking-engine's description of a BPE tokenizer in
//! spec §4.1: a vocabulary starting from 128 single-byte entries, trained
//! by iteratively promoting the most frequent adjacent pair until the
//! vocabulary is full, and applying greedy pair merges (capped at 1,000
//! iterations per input) at tokenize time.

use std::collections::HashMap;
use std::sync::RwLock;

use super::Tokenizer;

/// Default vocabulary size target for [`BpeTokenizer::train`].
pub const DEFAULT_VOCAB_SIZE: usize = 50_000;

/// Hard cap on merge passes applied to a single input during `tokenize`.
const MAX_MERGE_ITERATIONS: usize = 1000;

struct Vocab {
    /// Learned merges in promotion order; earlier entries have priority.
    merges: Vec<(String, String)>,
    merge_rank: HashMap<(String, String), usize>,
}

impl Vocab {
    fn base() -> Self {
        Self { merges: Vec::new(), merge_rank: HashMap::new() }
    }

    fn size(&self) -> usize {
        128 + self.merges.len()
    }
}

pub struct BpeTokenizer {
    max_tokens: usize,
    vocab_size: usize,
    vocab: RwLock<Vocab>,
}

impl BpeTokenizer {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens, vocab_size: DEFAULT_VOCAB_SIZE, vocab: RwLock::new(Vocab::base()) }
    }

    pub fn with_vocab_size(max_tokens: usize, vocab_size: usize) -> Self {
        Self { max_tokens, vocab_size, vocab: RwLock::new(Vocab::base()) }
    }

    /// Splits `text` into its initial per-character unit tokens (the base
    /// alphabet before any merges are applied).
    fn base_units(text: &str) -> Vec<String> {
        text.chars().map(|c| c.to_string()).collect()
    }

    /// Scans `corpus`, counts adjacent-pair frequencies among the current
    /// unit sequence, and iteratively promotes the most frequent pair to a
    /// new vocabulary entry until the vocabulary reaches `vocab_size` or no
    /// pair occurs more than once.
    pub fn train(&self, corpus: &str) {
        let mut units = Self::base_units(corpus);
        let mut vocab = self.vocab.write().unwrap();

        while vocab.size() < self.vocab_size {
            let mut counts: HashMap<(String, String), usize> = HashMap::new();
            for window in units.windows(2) {
                let pair = (window[0].clone(), window[1].clone());
                *counts.entry(pair).or_insert(0) += 1;
            }
            let best = counts
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .max_by_key(|(_, count)| *count);

            let Some((pair, _)) = best else { break };

            let merged = format!("{}{}", pair.0, pair.1);
            let rank = vocab.merges.len();
            vocab.merges.push(pair.clone());
            vocab.merge_rank.insert(pair.clone(), rank);

            // Apply the new merge to the working unit sequence so later
            // pair counts reflect it.
            let mut next = Vec::with_capacity(units.len());
            let mut i = 0;
            while i < units.len() {
                if i + 1 < units.len() && units[i] == pair.0 && units[i + 1] == pair.1 {
                    next.push(merged.clone());
                    i += 2;
                } else {
                    next.push(units[i].clone());
                    i += 1;
                }
            }
            units = next;
        }
    }

    fn apply_merges(&self, units: Vec<String>) -> Vec<String> {
        let vocab = self.vocab.read().unwrap();
        if vocab.merge_rank.is_empty() {
            return units;
        }

        let mut current = units;
        for _ in 0..MAX_MERGE_ITERATIONS {
            let mut best_rank = usize::MAX;
            let mut best_index = None;
            for i in 0..current.len().saturating_sub(1) {
                let pair = (current[i].clone(), current[i + 1].clone());
                if let Some(&rank) = vocab.merge_rank.get(&pair) {
                    if rank < best_rank {
                        best_rank = rank;
                        best_index = Some(i);
                    }
                }
            }
            let Some(i) = best_index else { break };
            let merged = format!("{}{}", current[i], current[i + 1]);
            current.splice(i..=i + 1, [merged]);
        }
        current
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.apply_merges(Self::base_units(text)).len().min(self.max_tokens)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = self.apply_merges(Self::base_units(text));
        tokens.truncate(self.max_tokens);
        tokens
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrained_tokenizer_is_per_character() {
        let t = BpeTokenizer::new(100);
        assert_eq!(t.tokenize("abc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn training_merges_frequent_pairs() {
        let t = BpeTokenizer::with_vocab_size(100, 130);
        t.train("ababab ababab ababab");
        let tokens = t.tokenize("ababab");
        assert!(tokens.len() < 6, "expected merges to shrink token count, got {:?}", tokens);
    }

    #[test]
    fn respects_max_tokens_cap() {
        let t = BpeTokenizer::new(2);
        assert_eq!(t.tokenize("abcdef").len(), 2);
    }
}
