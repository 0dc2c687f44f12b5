//! Export converters: two independent terminal paths from the markup file.
//!
//! * [`presentation`] — external Marp CLI render, bounded by the remaining
//!   wall-clock budget.
//! * [`deck`] + [`pptx`] — in-process markup parse and `.pptx` package
//!   write; no external process.
//!
//! Output names are collision-avoided with numbered suffixes:
//! `name.ext`, `name_2.ext`, `name_3.ext`, …

pub mod deck;
pub mod pptx;
pub mod presentation;

use std::path::{Path, PathBuf};

/// First free output path for `base.ext` inside `dir`.
pub fn unique_output_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{base}.{ext}"));
    let mut index = 2;
    while candidate.exists() {
        candidate = dir.join(format!("{base}_{index}.{ext}"));
        index += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collisions_get_numbered_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "paper", "pdf"),
            dir.path().join("paper.pdf")
        );

        std::fs::write(dir.path().join("paper.pdf"), b"x").unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "paper", "pdf"),
            dir.path().join("paper_2.pdf")
        );

        std::fs::write(dir.path().join("paper_2.pdf"), b"x").unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "paper", "pdf"),
            dir.path().join("paper_3.pdf")
        );
    }
}
