//! End-to-end integration tests over synthetic PDFs.
//!
//! The PDFs are built in-memory with lopdf so the tests need no fixtures,
//! no network, and no external renderer: they exercise extraction, metadata,
//! record persistence, markup generation, markup re-parsing, and the .pptx
//! writer. The LLM call and the Marp subprocess are covered by their own
//! budget/failure tests — the reply parser is driven directly here.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf2marp::config::ImageFilter;
use pdf2marp::export::deck::parse_markup;
use pdf2marp::export::deck::export_deck;
use pdf2marp::pipeline::images::extract_images;
use pdf2marp::pipeline::summarize::parse_summary;
use pdf2marp::process::build_record;
use pdf2marp::read_metadata;
use pdf2marp::slides::generate::{build_slides, generate_markup, RECORD_FILE_NAME};
use pdf2marp::slides::Slide;
use pdf2marp::{paperxml, Deadline, PaperRecord};
use std::io::Cursor;
use std::path::Path;

// ── Synthetic PDF builder ────────────────────────────────────────────────────

struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
        }
    }

    /// Embed a JPEG as an image XObject; returns its cross-reference id.
    fn add_jpeg(&mut self, jpeg: &[u8], width: u32, height: u32) -> ObjectId {
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.to_vec(),
        ))
    }

    fn add_page(&mut self, text: Option<&str>, images: &[ObjectId]) {
        let mut operations = Vec::new();
        if let Some(text) = text {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let mut xobjects = lopdf::Dictionary::new();
        for (i, &img_id) in images.iter().enumerate() {
            let name = format!("Im{i}");
            xobjects.set(name.as_bytes().to_vec(), img_id);
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![400.into(), 0.into(), 0.into(), 400.into(), 100.into(), 100.into()],
                ),
                Operation::new("Do", vec![name.as_str().into()]),
                Operation::new("Q", vec![]),
            ]);
        }

        let content = Content { operations };
        let content_id = self.doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let resources = dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => Object::Dictionary(xobjects),
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        self.page_ids.push(page_id);
    }

    fn save(mut self, path: &Path, title: Option<&str>) {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = self.page_ids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        if let Some(title) = title {
            let info_id = self.doc.add_object(dictionary! {
                "Title" => Object::string_literal(title),
                "Author" => Object::string_literal("Alice, Bob"),
            });
            self.doc.trailer.set("Info", info_id);
        }
        self.doc.save(path).expect("pdf saves");
    }
}

/// A noisy JPEG that compresses to comfortably more than the 2 KB floor.
fn jpeg_bytes(seed: u32, width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 31 + y * 17 + seed * 97) % 251) as u8,
            ((x * 7 ^ y * 13) % 241) as u8,
            ((x + y * 3 + seed) % 239) as u8,
        ])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .expect("jpeg encodes");
    buf
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn end_to_end_synthetic_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("test_paper.pdf");

    let jpeg = jpeg_bytes(1, 500, 500);
    assert!(jpeg.len() > 2048, "fixture must clear the byte floor");

    let mut builder = PdfBuilder::new();
    let img_id = builder.add_jpeg(&jpeg, 500, 500);
    builder.add_page(Some("Example abstract."), &[img_id]);
    builder.save(&pdf_path, Some("Test Paper"));

    // ── extraction ──
    let record_dir = dir.path().join("out/xmls/test_paper");
    let images_dir = record_dir.join("images");
    let extracted = extract_images(&pdf_path, &images_dir, &ImageFilter::default()).unwrap();
    assert_eq!(extracted.len(), 1, "exactly one extracted image");
    assert_eq!((extracted[0].width, extracted[0].height), (500, 500));
    assert_eq!(extracted[0].page, 1);
    let on_disk = images_dir.join(&extracted[0].name);
    assert!(on_disk.exists());
    assert!(std::fs::metadata(&on_disk).unwrap().len() > 2048);

    // ── metadata ──
    let meta = read_metadata(&pdf_path, 3, 2000).expect("metadata present");
    assert_eq!(meta.title, "Test Paper");
    assert_eq!(meta.authors, vec!["Alice", "Bob"]);

    // ── record merge + persistence round trip ──
    let record = build_record(
        meta,
        parse_summary(""),
        &extracted,
        &images_dir,
        None,
        PaperRecord::entry_id_from(&pdf_path),
    );
    let record_path = record_dir.join(RECORD_FILE_NAME);
    paperxml::save_record(&record, &record_path).unwrap();
    let reloaded = paperxml::load_record(&record_path).unwrap();
    assert_eq!(reloaded.title, "Test Paper");
    assert_eq!(reloaded.images.len(), 1, "exactly one image path");
    assert_eq!(reloaded.image_count.count, "1");
    assert_eq!(reloaded.problem, "N/A");
    assert_eq!(reloaded, record);

    // ── slide document: title, detail, one image ──
    let marp_dir = dir.path().join("out/output_marp");
    std::fs::create_dir_all(&marp_dir).unwrap();
    let doc = build_slides(&reloaded, &record_dir, &marp_dir, 1);
    assert_eq!(doc.slides.len(), 3);
    assert!(matches!(&doc.slides[0], Slide::Title { title } if title == "Test Paper"));
    assert!(matches!(&doc.slides[1], Slide::Text { .. }));
    assert!(matches!(&doc.slides[2], Slide::Image { .. }));

    // ── markup file ──
    let markup_path = generate_markup(&record_dir, &marp_dir, 1).unwrap();
    assert!(markup_path.ends_with("Test_Paper_output.md"));
    let md = std::fs::read_to_string(&markup_path).unwrap();
    assert!(md.starts_with("---\nmarp: true\n"));
    assert!(md.contains("# Test Paper"));
    assert!(md.contains("__課題__ N/A"));

    // ── markup re-parse (deck model) ──
    let deck = parse_markup(&md);
    assert_eq!(deck.front_matter.get("size").map(String::as_str), Some("16:9"));
    assert_eq!(deck.slides.len(), 3);

    // ── deck export ──
    let pptx_path = dir.path().join("out/output_marp/Test_Paper_output.pptx");
    export_deck(&markup_path, &pptx_path, &Deadline::new(30)).unwrap();
    let pptx = std::fs::File::open(&pptx_path).unwrap();
    let mut archive = zip::ZipArchive::new(pptx).unwrap();
    assert!(archive.by_name("ppt/presentation.xml").is_ok());
    // title slide + 3 parsed units
    assert!(archive.by_name("ppt/slides/slide4.xml").is_ok());
    assert!(archive.by_name("ppt/slides/slide5.xml").is_err());
}

#[test]
fn repeated_reference_is_extracted_once() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("dup.pdf");

    let jpeg = jpeg_bytes(2, 480, 480);
    let mut builder = PdfBuilder::new();
    let img_id = builder.add_jpeg(&jpeg, 480, 480);
    builder.add_page(Some("p1"), &[img_id]);
    builder.add_page(Some("p2"), &[img_id]);
    builder.save(&pdf_path, None);

    let extracted =
        extract_images(&pdf_path, &dir.path().join("images"), &ImageFilter::default()).unwrap();
    assert_eq!(extracted.len(), 1, "same xref must extract once");
    assert_eq!(extracted[0].page, 1, "first reference wins");
}

#[test]
fn extraction_stops_at_the_image_cap() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("many.pdf");

    let mut builder = PdfBuilder::new();
    let ids: Vec<ObjectId> = (0..3)
        .map(|i| {
            let jpeg = jpeg_bytes(10 + i, 450, 450);
            builder.add_jpeg(&jpeg, 450, 450)
        })
        .collect();
    builder.add_page(None, &ids[..2]);
    builder.add_page(None, &ids[2..]);
    builder.save(&pdf_path, None);

    let filter = ImageFilter {
        max_images: 2,
        ..ImageFilter::default()
    };
    let extracted = extract_images(&pdf_path, &dir.path().join("images"), &filter).unwrap();
    assert_eq!(extracted.len(), 2, "cap binds");
    assert!(extracted.iter().all(|img| img.page == 1), "later pages never visited");
}

#[test]
fn undersized_and_extreme_images_are_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("filtered.pdf");

    let mut builder = PdfBuilder::new();
    // both dimensions under the 400 minimum: dropped
    let small = {
        let jpeg = jpeg_bytes(3, 399, 399);
        builder.add_jpeg(&jpeg, 399, 399)
    };
    // 4096x256 = 16:1 aspect: dropped
    let banner = {
        let jpeg = jpeg_bytes(4, 4096, 256);
        builder.add_jpeg(&jpeg, 4096, 256)
    };
    // 800x120: under min height but over min width (inclusive-OR keep),
    // aspect 6.7:1 is inside the cap
    let wide = {
        let jpeg = jpeg_bytes(5, 800, 120);
        builder.add_jpeg(&jpeg, 800, 120)
    };
    builder.add_page(None, &[small, banner, wide]);
    builder.save(&pdf_path, None);

    let extracted =
        extract_images(&pdf_path, &dir.path().join("images"), &ImageFilter::default()).unwrap();
    assert_eq!(extracted.len(), 1);
    assert_eq!((extracted[0].width, extracted[0].height), (800, 120));
}
