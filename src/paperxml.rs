//! Persistence of [`PaperRecord`] as `paper.xml`.
//!
//! Nested key-value XML with lists as repeated elements; round-trip safe:
//! re-saving an unmodified loaded record reproduces identical content.
//! [`update_title`] is the one supported post-creation mutation.

use crate::error::Pdf2MarpError;
use crate::record::PaperRecord;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Serialise a record to its XML document form.
pub fn to_xml_string(record: &PaperRecord) -> Result<String, Pdf2MarpError> {
    let mut body = String::new();
    let mut ser = quick_xml::se::Serializer::with_root(&mut body, Some("paper"))
        .map_err(|e| Pdf2MarpError::RecordError {
            detail: e.to_string(),
        })?;
    ser.indent(' ', 3);
    record
        .serialize(ser)
        .map_err(|e| Pdf2MarpError::RecordError {
            detail: e.to_string(),
        })?;

    let mut xml = String::with_capacity(XML_DECL.len() + body.len() + 1);
    xml.push_str(XML_DECL);
    xml.push_str(&body);
    xml.push('\n');
    Ok(xml)
}

/// Parse a record back from its XML document form.
pub fn from_xml_string(xml: &str) -> Result<PaperRecord, Pdf2MarpError> {
    quick_xml::de::from_str(xml).map_err(|e| Pdf2MarpError::RecordError {
        detail: e.to_string(),
    })
}

/// Write `record` to `path`, creating parent directories as needed.
pub fn save_record(record: &PaperRecord, path: &Path) -> Result<(), Pdf2MarpError> {
    let xml = to_xml_string(record)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Pdf2MarpError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, xml).map_err(|e| Pdf2MarpError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("Saved record → {}", path.display());
    Ok(())
}

/// Load a record from `path`.
pub fn load_record(path: &Path) -> Result<PaperRecord, Pdf2MarpError> {
    if !path.exists() {
        return Err(Pdf2MarpError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let xml = fs::read_to_string(path).map_err(|e| Pdf2MarpError::RecordError {
        detail: format!("{}: {e}", path.display()),
    })?;
    from_xml_string(&xml)
}

/// Load, replace exactly the title field, and rewrite the full document.
pub fn update_title(path: &Path, new_title: &str) -> Result<PaperRecord, Pdf2MarpError> {
    let mut record = load_record(path)?;
    record.title = new_title.to_string();
    save_record(&record, path)?;
    Ok(record)
}
