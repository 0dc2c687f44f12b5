//! First-page preview crop: render page one and keep the title/author band.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations.
//!
//! ## Why this band?
//!
//! Academic papers put title and authors in the upper half of page one,
//! under a running header. Cropping from 5 % to 55 % of the height isolates
//! that block: skip the top 1/20, keep the next 1/2 of total height.

use crate::error::Pdf2MarpError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the preview crop inside the images directory.
pub const PREVIEW_FILE_NAME: &str = "half.png";

/// Render the first page of `pdf_path` at 2× scale, crop the title band,
/// and save it as `half.png` inside `images_dir`.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_preview(pdf_path: &Path, images_dir: &Path) -> Result<PathBuf, Pdf2MarpError> {
    let path = pdf_path.to_path_buf();
    let dir = images_dir.to_path_buf();

    tokio::task::spawn_blocking(move || render_preview_blocking(&path, &dir))
        .await
        .map_err(|e| Pdf2MarpError::Internal(format!("Preview task panicked: {e}")))?
}

fn render_preview_blocking(pdf_path: &Path, images_dir: &Path) -> Result<PathBuf, Pdf2MarpError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Pdf2MarpError::PreviewFailed {
                detail: format!("{e:?}"),
            })?;

    let pages = document.pages();
    let page = pages.get(0).map_err(|e| Pdf2MarpError::PreviewFailed {
        detail: format!("no first page: {e:?}"),
    })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(2.0);
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| Pdf2MarpError::PreviewFailed {
            detail: format!("{e:?}"),
        })?;

    let rendered = bitmap.as_image();
    debug!(
        "Rendered first page → {}x{} px",
        rendered.width(),
        rendered.height()
    );

    let cropped = crop_title_band(&rendered);
    let out_path = images_dir.join(PREVIEW_FILE_NAME);
    cropped
        .save(&out_path)
        .map_err(|e| Pdf2MarpError::PreviewFailed {
            detail: format!("saving '{}': {e}", out_path.display()),
        })?;

    Ok(out_path)
}

/// Full width, vertical band from 5 % to 55 % of the page height.
pub fn crop_title_band(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let top = height / 20;
    let band = (height / 2).min(height - top);
    image.crop_imm(0, top, width, band)
}
