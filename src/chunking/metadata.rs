//! Metadata suffix construction (spec §4.5 step 1).

use std::collections::BTreeMap;

/// Metadata keys excluded from both suffixes.
const IGNORED_METADATA_KEYS: &[&str] = &["ignore_for_qa"];

/// The two metadata suffix strings plus their token counts.
#[derive(Debug, Clone, Default)]
pub struct MetadataResult {
    pub semantic_suffix: String,
    pub keyword_suffix: String,
}

fn should_ignore_metadata_key(key: &str) -> bool {
    IGNORED_METADATA_KEYS.contains(&key.to_lowercase().as_str())
}

/// Trims, collapses interior whitespace, and replaces tab/newline/CR with a
/// single space.
pub fn clean_metadata_value(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    crate::text::normalize_whitespace(&replaced)
}

/// Builds the semantic (`"Metadata:\n\t<key> - <value>\n..."`, trailing
/// newline trimmed) and keyword (space-joined values) suffixes, skipping
/// ignored keys and empty cleaned values.
pub fn process_metadata(metadata: &BTreeMap<String, String>) -> MetadataResult {
    let mut semantic_lines = Vec::new();
    let mut keyword_values = Vec::new();

    for (key, value) in metadata {
        if should_ignore_metadata_key(key) {
            continue;
        }
        let cleaned = clean_metadata_value(value);
        if cleaned.is_empty() {
            continue;
        }
        semantic_lines.push(format!("\t{} - {}", key, cleaned));
        keyword_values.push(cleaned);
    }

    let semantic_suffix = if semantic_lines.is_empty() {
        String::new()
    } else {
        format!("Metadata:\n{}", semantic_lines.join("\n"))
    };

    MetadataResult {
        semantic_suffix,
        keyword_suffix: keyword_values.join(" "),
    }
}

/// `metadata_tokens / chunk_token_limit > max_metadata_percentage`, i.e.
/// whether metadata should be cleared. Strictly greater, per the
/// invariant's `≤` framing in spec §3 invariant 3.
pub fn is_metadata_too_large(metadata_tokens: usize, chunk_token_limit: usize, max_metadata_percentage: f64) -> bool {
    if chunk_token_limit == 0 {
        return metadata_tokens > 0;
    }
    (metadata_tokens as f64 / chunk_token_limit as f64) > max_metadata_percentage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_configured_key() {
        let mut metadata = BTreeMap::new();
        metadata.insert("ignore_for_qa".to_string(), "secret".to_string());
        metadata.insert("author".to_string(), "Ada".to_string());
        let result = process_metadata(&metadata);
        assert!(!result.semantic_suffix.contains("secret"));
        assert!(result.semantic_suffix.contains("author - Ada"));
        assert_eq!(result.keyword_suffix, "Ada");
    }

    #[test]
    fn cleans_whitespace_in_values() {
        let mut metadata = BTreeMap::new();
        metadata.insert("note".to_string(), "line1\nline2\ttabbed".to_string());
        let result = process_metadata(&metadata);
        assert_eq!(result.keyword_suffix, "line1 line2 tabbed");
    }

    #[test]
    fn metadata_too_large_is_strict_greater_than() {
        assert!(!is_metadata_too_large(25, 100, 0.25));
        assert!(is_metadata_too_large(26, 100, 0.25));
    }
}
