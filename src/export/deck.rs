//! Deck export: parse the markup document back into slides and write a
//! `.pptx` package. Pure in-process — no external tool.
//!
//! Parsing contract: HTML-style comments are styling directives and are
//! stripped before business parsing; front matter is simple `key: value`
//! lines between `---` delimiters; the body splits on `---` separator lines
//! into slide units. A unit with list items is a bullet slide — when
//! paragraphs are present too, they are appended to the bullet list rather
//! than kept separate.

use crate::deadline::Deadline;
use crate::error::Pdf2MarpError;
use crate::export::pptx;
use crate::slides::Slide;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

/// A parsed markup document: front matter plus slide units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeckDocument {
    pub front_matter: BTreeMap<String, String>,
    pub slides: Vec<Slide>,
}

/// Write `markup_path` as a `.pptx` deck at `output_path`.
///
/// The budget is checked once up front; the single conversion attempt then
/// runs to completion.
pub fn export_deck(
    markup_path: &Path,
    output_path: &Path,
    deadline: &Deadline,
) -> Result<(), Pdf2MarpError> {
    deadline.check("export-deck")?;

    if !markup_path.exists() {
        return Err(Pdf2MarpError::NotFound {
            path: markup_path.to_path_buf(),
        });
    }
    let md = std::fs::read_to_string(markup_path).map_err(|e| Pdf2MarpError::ExportFailed {
        tool: "pptx".to_string(),
        detail: format!("reading '{}': {e}", markup_path.display()),
    })?;

    let deck = parse_markup(&md);
    pptx::write_pptx(&deck, output_path)?;
    info!("Deck exported → {}", output_path.display());
    Ok(())
}

/// Parse markup text into a [`DeckDocument`].
pub fn parse_markup(md_text: &str) -> DeckDocument {
    let stripped = COMMENT_RE.replace_all(md_text, "");
    let (front_matter, body) = parse_front_matter(stripped.trim());
    let slides = split_units(&body)
        .iter()
        .map(|unit| parse_unit(unit))
        .collect();
    DeckDocument {
        front_matter,
        slides,
    }
}

/// Front matter: `key: value` lines between a leading `---` line and the
/// next `---` line. Anything before a missing delimiter is left in the body.
fn parse_front_matter(text: &str) -> (BTreeMap<String, String>, String) {
    let mut fm = BTreeMap::new();
    let mut lines = text.lines();

    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => return (fm, text.to_string()),
    }

    let mut in_front_matter = true;
    let mut body_lines: Vec<&str> = Vec::new();
    for line in lines {
        if in_front_matter {
            if line.trim() == "---" {
                in_front_matter = false;
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                if !key.is_empty() {
                    fm.insert(key.to_string(), value.trim().to_string());
                }
            }
        } else {
            body_lines.push(line);
        }
    }

    (fm, body_lines.join("\n"))
}

/// Split the body on `---` separator lines into non-empty units.
fn split_units(body: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |current: &mut Vec<&str>, units: &mut Vec<String>| {
        let unit = current.join("\n").trim().to_string();
        if !unit.is_empty() {
            units.push(unit);
        }
        current.clear();
    };

    for line in body.lines() {
        if line.trim() == "---" {
            flush(&mut current, &mut units);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut units);
    units
}

/// Classify one unit as a bullet or text slide.
fn parse_unit(unit: &str) -> Slide {
    let mut title: Option<String> = None;
    let mut bullets: Vec<String> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();

    for raw in unit.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if title.is_none() {
                title = Some(line.trim_start_matches('#').trim().to_string());
            }
            continue;
        }
        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            bullets.push(item.trim().to_string());
            continue;
        }
        if line.starts_with("![") {
            // image reference, not body text
            continue;
        }
        paragraphs.push(line.to_string());
    }

    let title = title
        .or_else(|| {
            if paragraphs.is_empty() {
                None
            } else {
                Some(paragraphs.remove(0))
            }
        })
        .unwrap_or_else(|| "No Title".to_string());

    if !bullets.is_empty() {
        // list items win; paragraphs are appended to the bullet list
        bullets.extend(paragraphs);
        Slide::Bullets {
            title,
            bullets,
            notes: None,
        }
    } else {
        Slide::Text {
            title,
            lines: paragraphs,
            notes: None,
        }
    }
}
