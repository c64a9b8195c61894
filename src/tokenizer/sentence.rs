//! Sentence-aware tokenizer: word tokens plus one trailing punctuation
//! token per sentence when `preserve_punctuation` is enabled.

use super::Tokenizer;

pub struct SentenceTokenizer {
    max_tokens: usize,
    preserve_punctuation: bool,
}

impl SentenceTokenizer {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens, preserve_punctuation: true }
    }

    pub fn with_preserve_punctuation(max_tokens: usize, preserve_punctuation: bool) -> Self {
        Self { max_tokens, preserve_punctuation }
    }

    fn split(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut sentence = String::new();

        for c in text.chars() {
            if c == '.' || c == '!' || c == '?' {
                for word in sentence.split_whitespace() {
                    tokens.push(word.to_string());
                }
                sentence.clear();
                if self.preserve_punctuation {
                    tokens.push(c.to_string());
                }
            } else {
                sentence.push(c);
            }
        }
        for word in sentence.split_whitespace() {
            tokens.push(word.to_string());
        }
        tokens
    }
}

impl Tokenizer for SentenceTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.split(text).len().min(self.max_tokens)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = self.split(text);
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
    fn emits_trailing_punctuation_per_sentence() {
        let t = SentenceTokenizer::new(100);
        assert_eq!(
            t.tokenize("Hello world. Bye!"),
            vec!["Hello", "world", ".", "Bye", "!"]
        );
    }

    #[test]
    fn can_drop_punctuation() {
        let t = SentenceTokenizer::with_preserve_punctuation(100, false);
        assert_eq!(t.tokenize("Hello world. Bye!"), vec!["Hello", "world", "Bye"]);
    }
}
