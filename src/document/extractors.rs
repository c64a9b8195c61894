//! Pluggable format decoders: pull raw bytes for a file extension into
//! plain text. Grounded on `document_processor.hpp`'s `extract_text`
//! dispatch over PDF / plain-text / HTML, generalized into a trait registry
//! so callers can add their own formats via [`crate::Engine::register_extractor`].

use crate::error::{Error, Result};
use crate::text;

/// Decodes the raw bytes of one file format into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extracts text from `bytes`. `file_name` is given for diagnostics
    /// only; decoders must not depend on its extension.
    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String>;
}

/// UTF-8 (lossy) plain text decoder.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// HTML decoder: strips tags after lossy UTF-8 decoding.
pub struct HtmlExtractor;

impl TextExtractor for HtmlExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String> {
        let raw = String::from_utf8_lossy(bytes);
        Ok(text::remove_html_tags(&raw))
    }
}

/// PDF decoder backed by `pdf-extract`.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::DecodeFailed(format!("{file_name}: {e}")))
    }
}

/// Returns the lowercase extension of `file_name`, or an empty string if
/// there isn't one.
pub fn extension_of(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// A best-effort MIME type for a lowercase extension, used for `DocumentResult::mime_type`.
pub fn mime_type_for(extension: &str) -> String {
    match extension {
        "pdf" => "application/pdf",
        "html" | "htm" => "text/html",
        "txt" | "md" | "markdown" => "text/plain",
        "json" => "application/json",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
    .to_string()
}
