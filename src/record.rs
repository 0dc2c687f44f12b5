//! The intermediate paper record: one structured document per processed PDF.
//!
//! A [`PaperRecord`] merges the metadata reader, image extractor, and
//! summariser outputs. It is persisted once as `paper.xml`, may have its
//! title edited exactly once afterwards, and is the sole input of the slide
//! generator.
//!
//! The serialisation format has no native non-text leaf type, so every leaf
//! here is a string or a list of strings — numeric values (image counts and
//! dimensions) are coerced to strings at construction.
//!
//! Path invariant: every path-valued field has ALL whitespace replaced with
//! `_` before persistence. The downstream renderer treats raw paths as
//! markup tokens and whitespace breaks reference resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sentinel for an absent short-text field.
pub const NA: &str = "N/A";
/// Sentinel for an absent title or author.
pub const UNKNOWN: &str = "Unknown";

fn default_na() -> String {
    NA.to_string()
}

/// Replace every whitespace character with `_`.
pub fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// [`sanitize_component`] over a whole path, applied to its string form.
pub fn sanitize_path(p: &Path) -> PathBuf {
    PathBuf::from(sanitize_component(&p.to_string_lossy()))
}

/// One recovered embedded image, as recorded in the intermediate document.
///
/// All leaves are strings (see module docs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    pub page: String,
    pub width: String,
    pub height: String,
}

impl ImageEntry {
    pub fn new(name: impl Into<String>, page: u32, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            page: page.to_string(),
            width: width.to_string(),
            height: height.to_string(),
        }
    }
}

/// Count plus descriptors of the recovered images.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageCount {
    #[serde(default)]
    pub count: String,
    #[serde(default, rename = "image", skip_serializing_if = "Vec::is_empty")]
    pub image: Vec<ImageEntry>,
}

impl ImageCount {
    pub fn new(entries: Vec<ImageEntry>) -> Self {
        Self {
            count: entries.len().to_string(),
            image: entries,
        }
    }
}

/// The intermediate structured document for one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    #[serde(default = "default_na")]
    pub title_jp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default = "default_na")]
    pub abstract_text: String,
    #[serde(default = "default_na")]
    pub keywords: String,
    #[serde(default = "default_na")]
    pub problem: String,
    #[serde(default = "default_na")]
    pub method: String,
    #[serde(default = "default_na")]
    pub result: String,
    /// Publication year. Upstream metadata rarely carries one; the slide
    /// template prints the sentinel when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Source filename stem, whitespace replaced by `_`.
    pub entry_id: String,
    pub pdf_path: String,
    #[serde(default)]
    pub image_count: ImageCount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Path to the first-page preview crop, when one was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_img_path: Option<String>,
}

impl PaperRecord {
    /// Year for display, falling back to the sentinel.
    pub fn display_year(&self) -> &str {
        self.year.as_deref().unwrap_or(NA)
    }

    /// Entry id derived from a source file name: stem with whitespace → `_`.
    pub fn entry_id_from(pdf_path: &Path) -> String {
        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        sanitize_component(&stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_all_whitespace() {
        assert_eq!(sanitize_component("a b\tc\nd"), "a_b_c_d");
        assert_eq!(sanitize_component("no_space"), "no_space");
    }

    #[test]
    fn entry_id_strips_extension_and_spaces() {
        assert_eq!(
            PaperRecord::entry_id_from(Path::new("/papers/My Great Paper.pdf")),
            "My_Great_Paper"
        );
    }

    #[test]
    fn image_count_coerces_to_strings() {
        let ic = ImageCount::new(vec![ImageEntry::new("img01_00007.png", 1, 500, 500)]);
        assert_eq!(ic.count, "1");
        assert_eq!(ic.image[0].width, "500");
        assert_eq!(ic.image[0].page, "1");
    }
}
