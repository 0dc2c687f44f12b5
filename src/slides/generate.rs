//! Slide Generator: structured record → Marp markup file.
//!
//! Slide order is fixed and deterministic: one title slide, one combined
//! detail slide, an optional first-page preview slide, then one slide per
//! qualifying extracted image (sorted by file name — directory order is
//! platform-dependent).

use crate::error::Pdf2MarpError;
use crate::paperxml;
use crate::pipeline::preview::PREVIEW_FILE_NAME;
use crate::record::PaperRecord;
use crate::slides::{Slide, SlideDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// The record file the generator expects inside the record directory.
pub const RECORD_FILE_NAME: &str = "paper.xml";

static UNSAFE_TITLE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("valid regex"));

/// Fit box for extracted-image slides: 70 % of a 1600×900 region.
const FIT_BOX_WIDTH: f64 = 1600.0 * 0.7;
const FIT_BOX_HEIGHT: f64 = 900.0 * 0.7;

/// Display width of the first-page preview slide.
const PREVIEW_DISPLAY_WIDTH: u32 = 1400;

/// Generate the Marp markup file for the record stored in `record_dir`.
///
/// Fatal `NotFound` when the directory holds no `.xml` file at all, or no
/// `paper.xml` specifically.
pub fn generate_markup(
    record_dir: &Path,
    marp_dir: &Path,
    min_slide_image_kb: u64,
) -> Result<PathBuf, Pdf2MarpError> {
    if !has_xml_file(record_dir) {
        return Err(Pdf2MarpError::NotFound {
            path: record_dir.to_path_buf(),
        });
    }
    let record_path = record_dir.join(RECORD_FILE_NAME);
    if !record_path.exists() {
        return Err(Pdf2MarpError::NotFound { path: record_path });
    }

    let record = paperxml::load_record(&record_path)?;
    debug!("Generating markup for '{}'", record.title);

    std::fs::create_dir_all(marp_dir).map_err(|e| Pdf2MarpError::OutputWriteFailed {
        path: marp_dir.to_path_buf(),
        source: e,
    })?;

    let document = build_slides(&record, record_dir, marp_dir, min_slide_image_kb);
    let out_path = marp_dir.join(format!("{}_output.md", safe_title(&record.title)));
    std::fs::write(&out_path, document.to_marp()).map_err(|e| {
        Pdf2MarpError::OutputWriteFailed {
            path: out_path.clone(),
            source: e,
        }
    })?;

    Ok(out_path)
}

/// Build the slide document for `record`, resolving image paths relative to
/// `marp_dir`.
pub fn build_slides(
    record: &PaperRecord,
    record_dir: &Path,
    marp_dir: &Path,
    min_slide_image_kb: u64,
) -> SlideDocument {
    let mut slides = vec![Slide::Title {
        title: record.title.clone(),
    }];

    slides.push(Slide::Text {
        title: record.title_jp.clone(),
        lines: vec![
            record.title.clone(),
            format!("[{}] {}", record.display_year(), record.entry_id),
            format!("__課題__ {}", record.problem),
            format!("__手法__ {}", record.method),
            format!("__結果__ {}", record.result),
        ],
        notes: None,
    });

    // Preview slide only when the crop actually exists on disk.
    if let Some(half) = record.half_img_path.as_deref() {
        let half_path = Path::new(half);
        if half_path.exists() {
            slides.push(Slide::Image {
                path: relative_to(half_path, marp_dir).to_string_lossy().into_owned(),
                display_width: PREVIEW_DISPLAY_WIDTH,
            });
        } else {
            debug!("Preview '{half}' not found, skipping preview slide");
        }
    }

    let mut qualified = 0usize;
    for img_path in qualifying_images(&record_dir.join("images"), min_slide_image_kb) {
        let Ok((width, height)) = image::image_dimensions(&img_path) else {
            warn!("Unreadable image '{}', skipping", img_path.display());
            continue;
        };
        slides.push(Slide::Image {
            path: relative_to(&img_path, marp_dir).to_string_lossy().into_owned(),
            display_width: fit_display_width(width, height),
        });
        qualified += 1;
    }
    if qualified == 0 {
        warn!("No images above {min_slide_image_kb} KB for '{}'", record.title);
    }

    SlideDocument::new(slides)
}

fn has_xml_file(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                e.path()
                    .extension()
                    .map(|x| x.to_string_lossy().eq_ignore_ascii_case("xml"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Qualifying extracted images: png/jpg/jpeg, strictly above the size floor,
/// excluding the preview crop; sorted by file name.
fn qualifying_images(images_dir: &Path, min_kb: u64) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(images_dir) else {
        debug!("No images directory at '{}'", images_dir.display());
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy() != PREVIEW_FILE_NAME)
                .unwrap_or(false)
        })
        .filter(|p| {
            matches!(
                p.extension().map(|e| e.to_string_lossy().to_lowercase()),
                Some(ref ext) if ext == "png" || ext == "jpg" || ext == "jpeg"
            )
        })
        .filter(|p| {
            std::fs::metadata(p)
                .map(|m| m.len() as f64 / 1024.0 > min_kb as f64)
                .unwrap_or(false)
        })
        .collect();

    paths.sort();
    paths
}

/// Scale an image into the fit box preserving aspect ratio; the binding
/// constraint is whichever axis yields the smaller scale factor.
pub fn fit_display_width(width: u32, height: u32) -> u32 {
    if width == 0 || height == 0 {
        return 0;
    }
    let ratio = (FIT_BOX_WIDTH / width as f64).min(FIT_BOX_HEIGHT / height as f64);
    (ratio * width as f64) as u32
}

/// First 14 characters of the title with everything outside
/// `[A-Za-z0-9_-]` replaced by `_`.
pub fn safe_title(title: &str) -> String {
    let prefix: String = title.chars().take(14).collect();
    UNSAFE_TITLE_CHARS.replace_all(&prefix, "_").into_owned()
}

/// `path` expressed relative to `base` (both as given; no canonicalisation).
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_comps: Vec<Component> = path.components().collect();
    let base_comps: Vec<Component> = base.components().collect();

    let mut shared = 0;
    while shared < path_comps.len()
        && shared < base_comps.len()
        && path_comps[shared] == base_comps[shared]
    {
        shared += 1;
    }

    let mut rel = PathBuf::new();
    for _ in shared..base_comps.len() {
        rel.push("..");
    }
    for comp in &path_comps[shared..] {
        rel.push(comp.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ImageCount, NA};
    use image::{Rgb, RgbImage};

    fn sample_record(half_img_path: Option<String>) -> PaperRecord {
        PaperRecord {
            title: "Test Paper".into(),
            title_jp: "テスト論文".into(),
            authors: vec!["Alice".into()],
            abstract_text: "Example abstract.".into(),
            keywords: NA.into(),
            problem: "P".into(),
            method: "M".into(),
            result: "R".into(),
            year: None,
            entry_id: "test_paper".into(),
            pdf_path: "/in/test_paper.pdf".into(),
            image_count: ImageCount::default(),
            images: vec![],
            half_img_path,
        }
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 251) as u8, (y % 241) as u8, 7]));
        img.save(path).unwrap();
    }

    #[test]
    fn always_one_title_then_one_detail_slide() {
        let dir = tempfile::tempdir().unwrap();
        let doc = build_slides(&sample_record(None), dir.path(), dir.path(), 100);
        assert_eq!(doc.slides.len(), 2);
        assert!(matches!(&doc.slides[0], Slide::Title { title } if title == "Test Paper"));
        match &doc.slides[1] {
            Slide::Text { title, lines, .. } => {
                assert_eq!(title, "テスト論文");
                assert_eq!(lines[0], "Test Paper");
                assert_eq!(lines[1], "[N/A] test_paper");
                assert_eq!(lines[2], "__課題__ P");
            }
            other => panic!("expected detail slide, got {other:?}"),
        }
    }

    #[test]
    fn missing_preview_file_skips_the_preview_slide() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record(Some(
            dir.path().join("images/half.png").to_string_lossy().into_owned(),
        ));
        let doc = build_slides(&record, dir.path(), dir.path(), 100);
        assert_eq!(doc.slides.len(), 2);
    }

    #[test]
    fn present_preview_gets_full_width_slide() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("half.png"), 100, 50);

        let record = sample_record(Some(
            images.join("half.png").to_string_lossy().into_owned(),
        ));
        let doc = build_slides(&record, dir.path(), dir.path(), 100);
        assert_eq!(doc.slides.len(), 3);
        assert!(matches!(
            &doc.slides[2],
            Slide::Image { display_width: 1400, .. }
        ));
    }

    #[test]
    fn qualifying_images_respect_size_floor_and_exclude_preview() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("half.png"), 600, 600); // excluded by name
        write_png(&images.join("img01_00007.png"), 600, 600);
        std::fs::write(images.join("notes.txt"), b"not an image").unwrap();

        let found = qualifying_images(&images, 0);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("img01_00007.png"));

        // a floor above the file size drops it
        assert!(qualifying_images(&images, 10_000).is_empty());
    }

    #[test]
    fn display_width_binding_axis() {
        // box-ratio image: both axes bind equally, full box width
        assert_eq!(fit_display_width(3200, 1800), 1120);
        // taller than the box: height binds, displayed width shrinks
        assert_eq!(fit_display_width(1800, 3200), 354);
        assert!(fit_display_width(1800, 3200) < fit_display_width(3200, 1800));
        // wider than the box: width binds at the box width
        assert_eq!(fit_display_width(4000, 1000), 1120);
    }

    #[test]
    fn safe_title_truncates_then_substitutes() {
        assert_eq!(safe_title("Test Paper: A Study"), "Test_Paper__A_");
        assert_eq!(safe_title("short"), "short");
        assert_eq!(safe_title("日本語タイトル"), "_______");
    }

    #[test]
    fn relative_paths_walk_up_from_the_markup_dir() {
        let rel = relative_to(
            Path::new("/out/xmls/paper/images/fig.png"),
            Path::new("/out/output_marp"),
        );
        assert_eq!(rel, PathBuf::from("../xmls/paper/images/fig.png"));
    }

    #[test]
    fn generate_markup_requires_record_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_markup(dir.path(), dir.path(), 100).unwrap_err();
        assert!(matches!(err, Pdf2MarpError::NotFound { .. }));

        // an unrelated xml satisfies the directory check but not paper.xml
        std::fs::write(dir.path().join("other.xml"), "<x/>").unwrap();
        let err = generate_markup(dir.path(), dir.path(), 100).unwrap_err();
        match err {
            Pdf2MarpError::NotFound { path } => {
                assert!(path.ends_with(RECORD_FILE_NAME), "got {path:?}")
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn generate_markup_writes_named_output() {
        let dir = tempfile::tempdir().unwrap();
        let record_dir = dir.path().join("xmls/test_paper");
        std::fs::create_dir_all(&record_dir).unwrap();
        crate::paperxml::save_record(&sample_record(None), &record_dir.join(RECORD_FILE_NAME))
            .unwrap();

        let marp_dir = dir.path().join("output_marp");
        let out = generate_markup(&record_dir, &marp_dir, 100).unwrap();
        assert!(out.ends_with("Test_Paper_output.md"));
        let md = std::fs::read_to_string(out).unwrap();
        assert!(md.starts_with("---\nmarp: true\n"));
        assert!(md.contains("# Test Paper"));
        assert!(md.contains("# テスト論文"));
    }
}
