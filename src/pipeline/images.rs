//! Image Extractor: recover embedded raster images from a PDF.
//!
//! Walks each page's `Resources → XObject` table in page order, recovering
//! every image stream that survives the configured filters. Streams are
//! identified by their cross-reference id, so an image referenced from
//! several pages is extracted once. Recovered bytes are written to the
//! target directory immediately, one file per image — nothing is batched or
//! retained in memory.
//!
//! ## Recovery
//!
//! * `DCTDecode` streams are JPEG: without a soft mask the raw bytes are
//!   written as-is; with one, the base is decoded, the mask composited as an
//!   alpha channel, and the result PNG-encoded. If the mask cannot be
//!   decoded (or its dimensions differ) the unmasked image is used.
//! * `FlateDecode` / unfiltered streams are rebuilt from raw samples using
//!   width, height, and colour space (8-bit gray or RGB; anything else is
//!   skipped with a debug log) and PNG-encoded.

use crate::config::ImageFilter;
use crate::error::Pdf2MarpError;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// One recovered image: descriptor only, bytes are already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Synthesised file name: `img{page:02}_{xref:05}.{ext}`.
    pub name: String,
    /// 1-indexed page the image was first referenced from.
    pub page: u32,
    pub width: u32,
    pub height: u32,
}

struct Recovered {
    ext: &'static str,
    bytes: Vec<u8>,
}

/// Extract embedded images from `pdf_path` into `out_dir`.
///
/// Returns descriptors in extraction order. Stops the moment
/// `filter.max_images` images have been collected — the cap holds mid-page,
/// and later pages are never visited once it trips.
pub fn extract_images(
    pdf_path: &Path,
    out_dir: &Path,
    filter: &ImageFilter,
) -> Result<Vec<ExtractedImage>, Pdf2MarpError> {
    std::fs::create_dir_all(out_dir).map_err(|e| Pdf2MarpError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut doc = Document::load(pdf_path).map_err(|e| Pdf2MarpError::CorruptPdf {
        path: pdf_path.to_path_buf(),
        detail: e.to_string(),
    })?;
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| Pdf2MarpError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("decryption failed: {e}"),
        })?;
    }

    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut extracted: Vec<ExtractedImage> = Vec::new();

    'pages: for (page_no, page_id) in doc.get_pages() {
        if extracted.len() >= filter.max_images {
            break;
        }
        for xref in page_image_xobjects(&doc, page_id) {
            if extracted.len() >= filter.max_images {
                break 'pages;
            }
            if seen.contains(&xref) {
                continue;
            }

            let Some((width, height)) = image_dimensions(&doc, xref) else {
                continue;
            };
            // Either dimension reaching its minimum keeps the image.
            if !passes_dimension_filter(width, height, filter) {
                debug!("Skip {xref:?}: {width}x{height} under both minima");
                continue;
            }

            let Some(recovered) = recover_image(&doc, xref) else {
                debug!("Skip {xref:?}: could not recover pixel data");
                continue;
            };
            if recovered.bytes.len() <= filter.min_bytes {
                debug!("Skip {xref:?}: {} bytes at/below floor", recovered.bytes.len());
                continue;
            }
            if !passes_aspect_filter(width, height, filter.max_aspect_ratio) {
                debug!("Skip {xref:?}: aspect beyond {}", filter.max_aspect_ratio);
                continue;
            }

            let name = format!("img{page_no:02}_{:05}.{}", xref.0, recovered.ext);
            let out_path = out_dir.join(&name);
            std::fs::write(&out_path, &recovered.bytes).map_err(|e| {
                Pdf2MarpError::OutputWriteFailed {
                    path: out_path.clone(),
                    source: e,
                }
            })?;

            extracted.push(ExtractedImage {
                name,
                page: page_no,
                width,
                height,
            });
            seen.insert(xref);
        }
    }

    info!(
        "Extracted {} image(s) from '{}'",
        extracted.len(),
        pdf_path.display()
    );
    Ok(extracted)
}

/// Drop only when BOTH dimensions are under their minima (inclusive-OR keep).
fn passes_dimension_filter(width: u32, height: u32, filter: &ImageFilter) -> bool {
    !(width < filter.min_width && height < filter.min_height)
}

/// Reject banners/rules: neither w:h nor h:w may exceed the cap.
fn passes_aspect_filter(width: u32, height: u32, max_ratio: f32) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let (w, h) = (width as f32, height as f32);
    w / h <= max_ratio && h / w <= max_ratio
}

/// Image XObject references of one page, in resource-table order.
fn page_image_xobjects(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut refs = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return refs;
    };
    let Some(Object::Dictionary(resources)) =
        page.get(b"Resources").ok().map(|o| resolved(doc, o))
    else {
        return refs;
    };
    let Some(Object::Dictionary(xobjects)) =
        resources.get(b"XObject").ok().map(|o| resolved(doc, o))
    else {
        return refs;
    };

    for (_name, obj) in xobjects.iter() {
        if let Object::Reference(id) = obj {
            if let Ok(Object::Stream(stream)) = doc.get_object(*id) {
                if name_is(&stream.dict, b"Subtype", b"Image") {
                    refs.push(*id);
                }
            }
        }
    }
    refs
}

fn recover_image(doc: &Document, id: ObjectId) -> Option<Recovered> {
    let stream = image_stream(doc, id)?;
    let filters = stream_filters(&stream.dict);
    let is_dct = filters.iter().any(|f| f.as_slice() == b"DCTDecode");
    let mask_id = match stream.dict.get(b"SMask") {
        Ok(Object::Reference(m)) => Some(*m),
        _ => None,
    };

    // Plain JPEG with no mask: pass the encoded bytes straight through.
    if is_dct && mask_id.is_none() {
        return Some(Recovered {
            ext: "jpg",
            bytes: stream.content.clone(),
        });
    }

    let base = match decode_pixels(doc, stream, &filters) {
        Some(img) => img,
        // Masked JPEG whose base we cannot decode: unmasked fallback.
        None if is_dct => {
            return Some(Recovered {
                ext: "jpg",
                bytes: stream.content.clone(),
            })
        }
        None => return None,
    };

    let composited = match mask_id.and_then(|m| decode_mask(doc, m)) {
        Some(mask) if (mask.width(), mask.height()) == (base.width(), base.height()) => {
            apply_mask(&base, &mask)
        }
        _ => base,
    };

    encode_png(&composited).map(|bytes| Recovered { ext: "png", bytes })
}

/// Decode an image stream into pixels. `None` for unsupported encodings.
fn decode_pixels(doc: &Document, stream: &Stream, filters: &[Vec<u8>]) -> Option<DynamicImage> {
    let dict = &stream.dict;
    let width = dict_u32(dict, b"Width")?;
    let height = dict_u32(dict, b"Height")?;

    if filters.iter().any(|f| f.as_slice() == b"DCTDecode") {
        return image::load_from_memory(&stream.content).ok();
    }
    let supported = filters
        .iter()
        .all(|f| f.as_slice() == b"FlateDecode");
    if !supported {
        return None;
    }

    if dict_u32(dict, b"BitsPerComponent").unwrap_or(8) != 8 {
        return None;
    }

    let data = stream.decompressed_content().ok()?;
    let channels = color_channels(doc, dict)
        .or_else(|| infer_channels(data.len(), width, height))?;
    let expected = (width as usize) * (height as usize) * channels;
    if data.len() < expected {
        return None;
    }

    match channels {
        1 => GrayImage::from_raw(width, height, data[..expected].to_vec())
            .map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, data[..expected].to_vec())
            .map(DynamicImage::ImageRgb8),
        _ => None,
    }
}

fn decode_mask(doc: &Document, id: ObjectId) -> Option<GrayImage> {
    let stream = image_stream(doc, id)?;
    let filters = stream_filters(&stream.dict);
    decode_pixels(doc, stream, &filters).map(|img| img.to_luma8())
}

/// Composite a soft mask onto the base image as its alpha channel.
fn apply_mask(base: &DynamicImage, mask: &GrayImage) -> DynamicImage {
    let mut rgba = base.to_rgba8();
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = alpha.0[0];
    }
    DynamicImage::ImageRgba8(rgba)
}

fn encode_png(img: &DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(buf)
}

/// Samples-per-pixel from the colour space, resolving ICCBased indirection.
/// `None` for colour spaces we cannot rebuild (Indexed, CMYK, …).
fn color_channels(doc: &Document, dict: &Dictionary) -> Option<usize> {
    let cs = dict.get(b"ColorSpace").ok().map(|o| resolved(doc, o))?;
    match cs {
        Object::Name(n) => match n.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(3),
            b"DeviceGray" | b"CalGray" => Some(1),
            _ => None,
        },
        Object::Array(items) => {
            let mut it = items.iter();
            match it.next().map(|o| resolved(doc, o)) {
                Some(Object::Name(n)) if n.as_slice() == b"ICCBased" => {
                    let stream = it.next().and_then(|o| match o {
                        Object::Reference(id) => image_stream(doc, *id),
                        _ => None,
                    })?;
                    match dict_u32(&stream.dict, b"N")? {
                        1 => Some(1),
                        3 => Some(3),
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Last resort when no colour space is declared (common for soft masks).
fn infer_channels(data_len: usize, width: u32, height: u32) -> Option<usize> {
    let pixels = (width as usize) * (height as usize);
    if pixels == 0 {
        return None;
    }
    match data_len / pixels {
        1 => Some(1),
        3 => Some(3),
        _ => None,
    }
}

fn image_stream(doc: &Document, id: ObjectId) -> Option<&Stream> {
    match doc.get_object(id) {
        Ok(Object::Stream(s)) => Some(s),
        _ => None,
    }
}

fn image_dimensions(doc: &Document, id: ObjectId) -> Option<(u32, u32)> {
    let stream = image_stream(doc, id)?;
    Some((
        dict_u32(&stream.dict, b"Width")?,
        dict_u32(&stream.dict, b"Height")?,
    ))
}

fn stream_filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![n.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| match o {
                Object::Name(n) => Some(n.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn name_is(dict: &Dictionary, key: &[u8], value: &[u8]) -> bool {
    matches!(dict.get(key), Ok(Object::Name(n)) if n.as_slice() == value)
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok()? {
        Object::Integer(i) => u32::try_from(*i).ok(),
        _ => None,
    }
}

fn resolved<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}
