//! Whitespace + punctuation tokenizer.
//!
//! Grounded on `original_source/include/r3m/chunking/tokenizer.hpp`'s
//! `BasicTokenizer`: walk characters, emit a word token on a whitespace
//! boundary, and emit each punctuation character in the fixed set as its
//! own single-character token.

use super::Tokenizer;

const PUNCTUATION: &str = ".,!?;:()[]{}\"'`~@#$%^&*+=|\\/<>";

pub struct BasicTokenizer {
    max_tokens: usize,
}

impl BasicTokenizer {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();

        for c in text.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            } else if PUNCTUATION.contains(c) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}

impl Tokenizer for BasicTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.split_text(text).len().min(self.max_tokens)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = self.split_text(text);
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
    fn splits_words_and_punctuation() {
        let t = BasicTokenizer::new(100);
        assert_eq!(
            t.tokenize("Hello, world!"),
            vec!["Hello", ",", "world", "!"]
        );
    }

    #[test]
    fn caps_at_max_tokens() {
        let t = BasicTokenizer::new(2);
        assert_eq!(t.tokenize("one two three four"), vec!["one", "two"]);
        assert_eq!(t.count_tokens("one two three four"), 2);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        let t = BasicTokenizer::new(100);
        assert!(t.tokenize("").is_empty());
        assert_eq!(t.count_tokens(""), 0);
    }
}
