//! Metadata Reader: Info-dictionary fields plus a leading-pages text proxy.
//!
//! Returns `None` — never an error — when the document is missing,
//! unparsable, or encrypted with a non-blank password. "Unreadable" means
//! "skip" to the caller, which must branch explicitly instead of catching.

use crate::record::UNKNOWN;
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// PDF document metadata plus the abstract proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperMetadata {
    /// Info `Title`, or `"Unknown"`.
    pub title: String,
    /// Info `Author` split on `,`, or `["Unknown"]`.
    pub authors: Vec<String>,
    /// Info `Subject`, or `"N/A"`.
    pub subject: String,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// Concatenated text of the leading pages, truncated — a stand-in for
    /// the abstract, good enough as LLM context.
    pub abstract_text: String,
    pub pdf_path: PathBuf,
}

/// Read metadata from `path`.
///
/// `abstract_pages` caps how many leading pages feed the abstract proxy;
/// `abstract_max_chars` truncates the concatenated text.
///
/// Encrypted documents get one blank-password decryption attempt; failure
/// yields `None`.
pub fn read_metadata(
    path: &Path,
    abstract_pages: usize,
    abstract_max_chars: usize,
) -> Option<PaperMetadata> {
    if !path.exists() {
        return None;
    }

    let mut doc = match Document::load(path) {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to parse '{}': {e}", path.display());
            return None;
        }
    };

    if doc.is_encrypted() {
        if let Err(e) = doc.decrypt("") {
            warn!("Blank-password decryption failed for '{}': {e}", path.display());
            return None;
        }
    }

    let info = info_dictionary(&doc);

    let title = info
        .and_then(|d| text_field(d, b"Title"))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let authors = info
        .and_then(|d| text_field(d, b"Author"))
        .filter(|a| !a.is_empty())
        .map(|a| a.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_else(|| vec![UNKNOWN.to_string()]);

    let subject = info
        .and_then(|d| text_field(d, b"Subject"))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "N/A".to_string());

    let abstract_text = leading_text(&doc, abstract_pages, abstract_max_chars);
    debug!(
        "Metadata for '{}': title={:?}, {} abstract chars",
        path.display(),
        title,
        abstract_text.chars().count()
    );

    Some(PaperMetadata {
        title,
        authors,
        subject,
        producer: info.and_then(|d| text_field(d, b"Producer")),
        creation_date: info.and_then(|d| text_field(d, b"CreationDate")),
        modification_date: info.and_then(|d| text_field(d, b"ModDate")),
        abstract_text,
        pdf_path: path.to_path_buf(),
    })
}

/// Concatenated text of up to the first `pages` pages, truncated to
/// `max_chars` characters.
fn leading_text(doc: &Document, pages: usize, max_chars: usize) -> String {
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().take(pages).collect();
    if page_numbers.is_empty() {
        return String::new();
    }
    let text = doc.extract_text(&page_numbers).unwrap_or_default();
    text.trim().chars().take(max_chars).collect()
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn text_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when BOM-prefixed, byte-encoded otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
