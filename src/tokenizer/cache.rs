//! Per-document token-count cache.
//!
//! Resolves the spec's token-cache Open Question (§9): the original C++
//! source carries both an owned-key cache and a "fragment-borrow" cache
//! keyed by `string_view`s into an internal backing store. This crate
//! implements a single cache that keeps the backing-store discipline (so
//! `clear()` resets both the map and the store, matching the original's
//! contract) without resorting to unsafe self-referential borrows: the map
//! is keyed by a cheap `Box<str>` clone of each fragment.

use std::collections::HashMap;
use std::sync::Arc;

use super::Tokenizer;

/// A per-document, per-thread cache mapping a text fragment to its token
/// count, backed by a given [`Tokenizer`]. Never shared across workers.
pub struct TokenCache {
    tokenizer: Arc<dyn Tokenizer>,
    map: HashMap<Box<str>, usize>,
    store: Vec<Box<str>>,
}

impl TokenCache {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer, map: HashMap::new(), store: Vec::new() }
    }

    /// Returns the token count for `fragment`, computing and memoizing it
    /// on a cache miss.
    pub fn get_token_count(&mut self, fragment: &str) -> usize {
        if let Some(&count) = self.map.get(fragment) {
            return count;
        }
        let count = self.tokenizer.count_tokens(fragment);
        let boxed: Box<str> = fragment.into();
        self.store.push(boxed.clone());
        self.map.insert(boxed, count);
        count
    }

    /// Resets both the count map and the backing store.
    pub fn clear(&mut self) {
        self.map.clear();
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
