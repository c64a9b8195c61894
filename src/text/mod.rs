//! Text cleanup and normalization primitives.

use once_cell::sync::Lazy;
use regex::Regex;

/// `"\n\n"` — joins combined sections and large-chunk members.
pub const SECTION_SEPARATOR: &str = "\n\n";

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PRECOMPARE_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\s*\\"`#.,:-]"#).unwrap());

/// Unicode ranges stripped by [`clean_text`].
const UNICODE_FILTER_RANGES: &[(u32, u32)] = &[
    (0xFFF0, 0xFFFF),   // Specials
    (0x1F000, 0x1F9FF), // Emoticons / symbols
    (0x2000, 0x206F),   // General punctuation
    (0x2190, 0x21FF),   // Arrows
    (0x2700, 0x27BF),   // Dingbats
];

fn is_unicode_filtered(cp: u32) -> bool {
    UNICODE_FILTER_RANGES.iter().any(|(start, end)| cp >= *start && cp <= *end)
}

/// Strips characters in the Unicode filter set and all control characters
/// except `\n` and `\t`.
///
/// Operates over `char` (a full Unicode scalar value), not bytes, so
/// multi-byte sequences are filtered by codepoint rather than by raw byte —
/// the original C++ implementation filtered on a truncated per-byte basis,
/// which only behaves correctly for ASCII input.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            if is_unicode_filtered(c as u32) {
                return false;
            }
            c >= ' ' || c == '\n' || c == '\t'
        })
        .collect()
}

/// Collapses any whitespace run to a single space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text.trim(), " ").into_owned()
}

/// Lowercases and removes whitespace, asterisks, escaped quotes, and
/// `. , : \` " # -`. Used to compute stable byte offsets for `source_links`
/// keys independent of display whitespace.
pub fn shared_precompare_cleanup(text: &str) -> String {
    let lowered = text.to_lowercase();
    PRECOMPARE_STRIP_RE.replace_all(&lowered, "").into_owned()
}

/// Strips any `<...>` span.
pub fn remove_html_tags(text: &str) -> String {
    HTML_TAG_RE.replace_all(text, "").into_owned()
}

/// The substring up to the first terminator (`.`, `!`, `?`) or `max_len`
/// chars, whichever comes first, trimmed.
pub fn extract_blurb(text: &str, max_len: usize) -> String {
    let max_len_byte = text.char_indices().nth(max_len).map(|(i, _)| i).unwrap_or(text.len());

    let terminator_byte = text
        .char_indices()
        .find(|(i, c)| *i < max_len_byte && (*c == '.' || *c == '!' || *c == '?'))
        .map(|(i, c)| i + c.len_utf8());

    let cut = terminator_byte.unwrap_or(max_len_byte);
    text[..cut].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_control_chars_but_keeps_newline_tab() {
        let input = "hello\u{0007}\nworld\t!";
        assert_eq!(clean_text(input), "hello\nworld\t!");
    }

    #[test]
    fn clean_text_strips_dingbats_and_emoji() {
        let input = "ok \u{2705} done \u{1F600}";
        let cleaned = clean_text(input);
        assert!(!cleaned.contains('\u{2705}'));
        assert!(!cleaned.contains('\u{1F600}'));
        assert!(cleaned.contains("ok"));
    }

    #[test]
    fn clean_text_is_idempotent() {
        let input = "Hi\u{2705}  there\u{0007}\n";
        assert_eq!(clean_text(&clean_text(input)), clean_text(input));
    }

    #[test]
    fn normalize_whitespace_collapses_and_trims() {
        assert_eq!(normalize_whitespace("  a   b\n\tc  "), "a b c");
    }

    #[test]
    fn normalize_whitespace_is_idempotent() {
        let input = "  a   b\n\tc  ";
        let once = normalize_whitespace(input);
        assert_eq!(normalize_whitespace(&once), once);
    }

    #[test]
    fn precompare_cleanup_strips_punctuation_and_case() {
        assert_eq!(shared_precompare_cleanup("Hello, \"World\"! *note*"), "helloworldnote");
    }

    #[test]
    fn remove_html_tags_strips_spans() {
        assert_eq!(remove_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn extract_blurb_cuts_at_terminator() {
        assert_eq!(extract_blurb("Hello world. This is a test.", 100), "Hello world.");
    }

    #[test]
    fn extract_blurb_cuts_at_max_len_when_no_terminator() {
        let text = "a".repeat(200);
        assert_eq!(extract_blurb(&text, 100).len(), 100);
    }
}
