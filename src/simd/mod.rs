//! SIMD text primitives with scalar fallbacks.
//!
//! Every operation here has two implementations: a scalar one that is the
//! semantic reference, and (on x86_64 with AVX2 available at runtime) a
//! vectorized one. Callers only ever see the dispatching public function;
//! the scalar/SIMD split exists so the two can be equivalence-tested
//! against each other (see the `parity` tests below and
//! `tests/simd_equivalence.rs`).

use std::collections::HashSet;

/// Whitespace bytes recognized by [`count_whitespace`] and friends.
const WHITESPACE_BYTES: [u8; 4] = [b' ', b'\t', b'\n', b'\r'];

/// Punctuation bytes recognized by [`count_punctuation`]. Narrower than
/// libc's `ispunct` (which the original C++ implementation used) — this set
/// matches the operation table exactly.
const PUNCTUATION_BYTES: [u8; 6] = [b'.', b',', b'!', b'?', b';', b':'];

/// Reports whether an AVX2-accelerated path is available on this CPU.
pub fn supports_avx2() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Reports whether any SIMD path is available (currently just AVX2).
pub fn supports_simd() -> bool {
    supports_avx2()
}

/// Number of positions where `text[i] == c`.
pub fn count_char(text: &str, c: u8) -> usize {
    count_char_scalar(text.as_bytes(), c)
}

fn count_char_scalar(bytes: &[u8], c: u8) -> usize {
    bytes.iter().filter(|&&b| b == c).count()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn count_char_avx2(bytes: &[u8], c: u8) -> usize {
    use std::arch::x86_64::*;
    let mut total = 0usize;
    let needle = _mm256_set1_epi8(c as i8);
    let mut chunks = bytes.chunks_exact(32);
    for chunk in &mut chunks {
        let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
        let eq = _mm256_cmpeq_epi8(v, needle);
        let mask = _mm256_movemask_epi8(eq) as u32;
        total += mask.count_ones() as usize;
    }
    total += count_char_scalar(chunks.remainder(), c);
    total
}

/// Positions where `text[i]` is one of `{ ' ', '\t', '\n', '\r' }`.
pub fn count_whitespace(text: &str) -> usize {
    count_multi_scalar(text.as_bytes(), &WHITESPACE_BYTES)
}

/// Positions where `text[i]` is one of `{ . , ! ? ; : }`.
pub fn count_punctuation(text: &str) -> usize {
    count_multi_scalar(text.as_bytes(), &PUNCTUATION_BYTES)
}

fn count_multi_scalar(bytes: &[u8], set: &[u8]) -> usize {
    bytes.iter().filter(|&&b| set.contains(&b)).count()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn count_multi_avx2(bytes: &[u8], set: &[u8]) -> usize {
    use std::arch::x86_64::*;
    let mut total = 0usize;
    let needles: Vec<__m256i> = set.iter().map(|&c| _mm256_set1_epi8(c as i8)).collect();
    let mut chunks = bytes.chunks_exact(32);
    for chunk in &mut chunks {
        let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
        let mut any = _mm256_setzero_si256();
        for needle in &needles {
            any = _mm256_or_si256(any, _mm256_cmpeq_epi8(v, *needle));
        }
        let mask = _mm256_movemask_epi8(any) as u32;
        total += mask.count_ones() as usize;
    }
    total += count_multi_scalar(chunks.remainder(), set);
    total
}

/// Approximate whitespace-delimited word count: `count_whitespace(text) + 1`.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    count_whitespace(text) + 1
}

/// First position where `text[i..i+len(p)] == p`, if any.
pub fn find_substring(text: &str, pattern: &str) -> Option<usize> {
    text.find(pattern)
}

/// All positions of `pattern` in `text`. Requires `pattern.len() >= 2`;
/// returns an empty vector otherwise.
pub fn find_pattern(text: &str, pattern: &str) -> Vec<usize> {
    if pattern.len() < 2 {
        return Vec::new();
    }
    let bytes = text.as_bytes();
    let pat = pattern.as_bytes();
    let mut out = Vec::new();
    if bytes.len() < pat.len() {
        return out;
    }
    for i in 0..=(bytes.len() - pat.len()) {
        if &bytes[i..i + pat.len()] == pat {
            out.push(i);
        }
    }
    out
}

/// For each 2-byte pair, all starting positions in `text`, flattened.
pub fn find_bpe_pairs(text: &str, pairs: &[String]) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    for pair in pairs {
        let p = pair.as_bytes();
        if p.len() != 2 || bytes.len() < 2 {
            continue;
        }
        for i in 0..bytes.len() - 1 {
            if bytes[i] == p[0] && bytes[i + 1] == p[1] {
                out.push(i);
            }
        }
    }
    out
}

/// Positions where `text[i] ∈ { . ! ? \n }`.
pub fn find_sentence_boundaries(text: &str) -> Vec<usize> {
    const BOUNDARY: [u8; 4] = [b'.', b'!', b'?', b'\n'];
    text.as_bytes()
        .iter()
        .enumerate()
        .filter(|(_, &b)| BOUNDARY.contains(&b))
        .map(|(i, _)| i)
        .collect()
}

/// Splits `text` on byte `delimiter`; an empty trailing segment is omitted.
pub fn split_by_delimiter(text: &str, delimiter: u8) -> Vec<String> {
    let mut out: Vec<String> = text
        .as_bytes()
        .split(|&b| b == delimiter)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    if out.last().map(|s| s.is_empty()).unwrap_or(false) {
        out.pop();
    }
    out
}

/// Removes every byte in `bytes_to_remove` from `text`, preserving order.
pub fn clean_text(text: &str, bytes_to_remove: &HashSet<u8>) -> String {
    let filtered: Vec<u8> = text
        .as_bytes()
        .iter()
        .copied()
        .filter(|b| !bytes_to_remove.contains(b))
        .collect();
    String::from_utf8_lossy(&filtered).into_owned()
}

/// Removes every whitespace byte (space, tab, CR, LF) from `text`.
pub fn normalize_for_search(text: &str) -> String {
    let filtered: Vec<u8> = text
        .as_bytes()
        .iter()
        .copied()
        .filter(|b| !WHITESPACE_BYTES.contains(b))
        .collect();
    String::from_utf8_lossy(&filtered).into_owned()
}

// --- public dispatchers that prefer the SIMD path when available ---

/// Dispatches to the AVX2 path when available, otherwise the scalar one.
/// Both paths are required (and tested) to return identical results.
pub fn count_char_dispatch(text: &str, c: u8) -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if supports_avx2() {
            return unsafe { count_char_avx2(text.as_bytes(), c) };
        }
    }
    count_char_scalar(text.as_bytes(), c)
}

/// Dispatches to the AVX2 path when available, otherwise the scalar one.
pub fn count_whitespace_dispatch(text: &str) -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if supports_avx2() {
            return unsafe { count_multi_avx2(text.as_bytes(), &WHITESPACE_BYTES) };
        }
    }
    count_multi_scalar(text.as_bytes(), &WHITESPACE_BYTES)
}

/// Dispatches to the AVX2 path when available, otherwise the scalar one.
pub fn count_punctuation_dispatch(text: &str) -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if supports_avx2() {
            return unsafe { count_multi_avx2(text.as_bytes(), &PUNCTUATION_BYTES) };
        }
    }
    count_multi_scalar(text.as_bytes(), &PUNCTUATION_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s6_simd_scalar_parity() {
        let text = "Hello, world! This is a test.";
        assert_eq!(count_whitespace(text), 5);
        assert_eq!(count_punctuation(text), 3);
        // Comma is not a sentence boundary (only `.!?\n` are); positions of
        // `!` and `.`.
        assert_eq!(find_sentence_boundaries(text), vec![12, 28]);

        assert_eq!(count_whitespace_dispatch(text), count_whitespace(text));
        assert_eq!(count_punctuation_dispatch(text), count_punctuation(text));
        assert_eq!(count_char_dispatch(text, b'l'), count_char(text, b'l'));
    }

    #[test]
    fn simd_equals_scalar_on_random_corpus() {
        let mut state: u64 = 0x2545F4914F6CDD1D;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let alphabet = b" \t\n\r.,!?;:abcdefghijklmnopqrstuvwxyzXYZ0123456789";
        let mut corpus = Vec::with_capacity(120_000);
        for _ in 0..120_000 {
            let idx = (next() % alphabet.len() as u64) as usize;
            corpus.push(alphabet[idx]);
        }
        let text = String::from_utf8_lossy(&corpus).into_owned();

        assert_eq!(count_char_scalar(text.as_bytes(), b'a'), count_char_dispatch(&text, b'a'));
        assert_eq!(count_multi_scalar(text.as_bytes(), &WHITESPACE_BYTES), count_whitespace_dispatch(&text));
        assert_eq!(count_multi_scalar(text.as_bytes(), &PUNCTUATION_BYTES), count_punctuation_dispatch(&text));
    }

    #[test]
    fn find_pattern_requires_len_two() {
        assert!(find_pattern("abcabc", "a").is_empty());
        assert_eq!(find_pattern("abcabc", "ab"), vec![0, 3]);
    }

    #[test]
    fn split_by_delimiter_omits_trailing_empty() {
        assert_eq!(split_by_delimiter("a,b,c,", b','), vec!["a", "b", "c"]);
        assert_eq!(split_by_delimiter("a,b,c", b','), vec!["a", "b", "c"]);
    }

    #[test]
    fn clean_text_removes_byte_set() {
        let mut set = HashSet::new();
        set.insert(b'x');
        assert_eq!(clean_text("axbxc", &set), "abc");
    }

    #[test]
    fn normalize_for_search_strips_whitespace() {
        assert_eq!(normalize_for_search("a b\tc\nd\r"), "abcd");
    }
}
