//! Minimal OOXML `.pptx` package writer.
//!
//! A `.pptx` file is a zip archive of XML parts: content types, package
//! relationships, the presentation part, one slide master + layout + theme,
//! and one slide part per slide. This writer emits the smallest package the
//! common viewers accept: a date-subtitled title slide followed by one
//! title-and-body slide per parsed unit.

use crate::error::Pdf2MarpError;
use crate::export::deck::DeckDocument;
use crate::slides::Slide;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// EMU slide sizes keyed by the front-matter `size:` value.
const SIZE_16_9: (u64, u64) = (12_192_000, 6_858_000);
const SIZE_4_3: (u64, u64) = (9_144_000, 6_858_000);

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Write `deck` as a `.pptx` package at `path`.
pub fn write_pptx(deck: &DeckDocument, path: &Path) -> Result<(), Pdf2MarpError> {
    let file = std::fs::File::create(path).map_err(|e| Pdf2MarpError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let (cx, cy) = slide_size(deck);
    // title slide + one per parsed unit
    let slide_count = deck.slides.len() + 1;

    let mut put = |name: &str, content: String| -> Result<(), Pdf2MarpError> {
        zip.start_file(name, options)
            .and_then(|_| zip.write_all(content.as_bytes()).map_err(Into::into))
            .map_err(|e| Pdf2MarpError::ExportFailed {
                tool: "pptx".to_string(),
                detail: format!("writing part '{name}': {e}"),
            })
    };

    put("[Content_Types].xml", content_types(slide_count))?;
    put("_rels/.rels", package_rels())?;
    put("ppt/presentation.xml", presentation(slide_count, cx, cy))?;
    put("ppt/_rels/presentation.xml.rels", presentation_rels(slide_count))?;
    put("ppt/theme/theme1.xml", theme())?;
    put("ppt/slideMasters/slideMaster1.xml", slide_master())?;
    put("ppt/slideMasters/_rels/slideMaster1.xml.rels", master_rels())?;
    put("ppt/slideLayouts/slideLayout1.xml", slide_layout())?;
    put("ppt/slideLayouts/_rels/slideLayout1.xml.rels", layout_rels())?;

    put("ppt/slides/slide1.xml", title_slide_xml(deck))?;
    put("ppt/slides/_rels/slide1.xml.rels", slide_rels())?;
    for (i, slide) in deck.slides.iter().enumerate() {
        let n = i + 2;
        put(&format!("ppt/slides/slide{n}.xml"), body_slide_xml(slide))?;
        put(&format!("ppt/slides/_rels/slide{n}.xml.rels"), slide_rels())?;
    }

    zip.finish().map_err(|e| Pdf2MarpError::ExportFailed {
        tool: "pptx".to_string(),
        detail: format!("finalising package: {e}"),
    })?;
    Ok(())
}

fn slide_size(deck: &DeckDocument) -> (u64, u64) {
    match deck.front_matter.get("size").map(String::as_str) {
        Some("16:9") => SIZE_16_9,
        _ => SIZE_4_3,
    }
}

/// Title of the whole deck: front-matter `title:`, else the first unit's
/// heading, else the placeholder.
fn deck_title(deck: &DeckDocument) -> String {
    if let Some(t) = deck.front_matter.get("title") {
        if !t.is_empty() {
            return t.clone();
        }
    }
    deck.slides
        .first()
        .map(slide_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No Title".to_string())
}

fn slide_title(slide: &Slide) -> String {
    match slide {
        Slide::Title { title }
        | Slide::Text { title, .. }
        | Slide::Bullets { title, .. } => title.clone(),
        Slide::Image { .. } => String::new(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn content_types(slide_count: usize) -> String {
    let mut overrides = String::new();
    for n in 1..=slide_count {
        overrides.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
{overrides}\
</Types>"
    )
}

fn package_rels() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"{NS_REL}\">\
<Relationship Id=\"rId1\" Type=\"{REL_DOC}\" Target=\"ppt/presentation.xml\"/>\
</Relationships>"
    )
}

fn presentation(slide_count: usize, cx: u64, cy: u64) -> String {
    let mut slide_ids = String::new();
    for n in 1..=slide_count {
        let id = 255 + n;
        let rid = n + 1; // rId1 is the master
        slide_ids.push_str(&format!("<p:sldId id=\"{id}\" r:id=\"rId{rid}\"/>"));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
<p:sldIdLst>{slide_ids}</p:sldIdLst>\
<p:sldSz cx=\"{cx}\" cy=\"{cy}\"/>\
<p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
</p:presentation>"
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut rels = format!(
        "<Relationship Id=\"rId1\" Type=\"{REL_MASTER}\" Target=\"slideMasters/slideMaster1.xml\"/>"
    );
    for n in 1..=slide_count {
        let rid = n + 1;
        rels.push_str(&format!(
            "<Relationship Id=\"rId{rid}\" Type=\"{REL_SLIDE}\" Target=\"slides/slide{n}.xml\"/>"
        ));
    }
    let theme_rid = slide_count + 2;
    rels.push_str(&format!(
        "<Relationship Id=\"rId{theme_rid}\" Type=\"{REL_THEME}\" Target=\"theme/theme1.xml\"/>"
    ));
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"{NS_REL}\">{rels}</Relationships>"
    )
}

fn theme() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<a:theme xmlns:a=\"{NS_A}\" name=\"Office\"><a:themeElements>\
<a:clrScheme name=\"Office\">\
<a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1>\
<a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1>\
<a:dk2><a:srgbClr val=\"44546A\"/></a:dk2>\
<a:lt2><a:srgbClr val=\"E7E6E6\"/></a:lt2>\
<a:accent1><a:srgbClr val=\"4472C4\"/></a:accent1>\
<a:accent2><a:srgbClr val=\"ED7D31\"/></a:accent2>\
<a:accent3><a:srgbClr val=\"A5A5A5\"/></a:accent3>\
<a:accent4><a:srgbClr val=\"FFC000\"/></a:accent4>\
<a:accent5><a:srgbClr val=\"5B9BD5\"/></a:accent5>\
<a:accent6><a:srgbClr val=\"70AD47\"/></a:accent6>\
<a:hlink><a:srgbClr val=\"0563C1\"/></a:hlink>\
<a:folHlink><a:srgbClr val=\"954F72\"/></a:folHlink>\
</a:clrScheme>\
<a:fontScheme name=\"Office\">\
<a:majorFont><a:latin typeface=\"Calibri Light\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
<a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
</a:fontScheme>\
<a:fmtScheme name=\"Office\">\
<a:fillStyleLst>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
</a:fillStyleLst>\
<a:lnStyleLst>\
<a:ln w=\"6350\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
<a:ln w=\"12700\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
<a:ln w=\"19050\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
</a:lnStyleLst>\
<a:effectStyleLst>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
</a:effectStyleLst>\
<a:bgFillStyleLst>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
</a:bgFillStyleLst>\
</a:fmtScheme>\
</a:themeElements></a:theme>"
    )
}

const EMPTY_GROUP: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

fn slide_master() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sldMaster xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
<p:cSld><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld>\
<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" \
accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
</p:sldMaster>"
    )
}

fn master_rels() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"{NS_REL}\">\
<Relationship Id=\"rId1\" Type=\"{REL_LAYOUT}\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
<Relationship Id=\"rId2\" Type=\"{REL_THEME}\" Target=\"../theme/theme1.xml\"/>\
</Relationships>"
    )
}

fn slide_layout() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sldLayout xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" type=\"blank\" preserve=\"1\">\
<p:cSld><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>\
</p:sldLayout>"
    )
}

fn layout_rels() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"{NS_REL}\">\
<Relationship Id=\"rId1\" Type=\"{REL_MASTER}\" Target=\"../slideMasters/slideMaster1.xml\"/>\
</Relationships>"
    )
}

fn slide_rels() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"{NS_REL}\">\
<Relationship Id=\"rId1\" Type=\"{REL_LAYOUT}\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
</Relationships>"
    )
}

fn text_shape(id: u32, name: &str, y: u64, height: u64, paragraphs: &str) -> String {
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/>\
<p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr/></p:nvSpPr>\
<p:spPr><a:xfrm><a:off x=\"457200\" y=\"{y}\"/><a:ext cx=\"8229600\" cy=\"{height}\"/></a:xfrm>\
<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>\
<p:txBody><a:bodyPr wrap=\"square\"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"
    )
}

fn run_paragraph(text: &str, size_centipoints: u32, bold: bool, bullet: bool) -> String {
    let b = if bold { " b=\"1\"" } else { "" };
    let ppr = if bullet {
        "<a:pPr><a:buChar char=\"\u{2022}\"/></a:pPr>"
    } else {
        ""
    };
    format!(
        "<a:p>{ppr}<a:r><a:rPr lang=\"ja-JP\" sz=\"{size_centipoints}\"{b}/><a:t>{}</a:t></a:r></a:p>",
        escape(text)
    )
}

fn title_slide_xml(deck: &DeckDocument) -> String {
    let title = run_paragraph(&deck_title(deck), 4000, true, false);
    let date = chrono::Local::now().format("%Y年%m月%d日").to_string();
    let subtitle = run_paragraph(&date, 2000, false, false);
    slide_xml(&[
        text_shape(2, "Title", 1600200, 1600200, &title),
        text_shape(3, "Subtitle", 3600450, 900000, &subtitle),
    ])
}

fn body_slide_xml(slide: &Slide) -> String {
    let title = run_paragraph(&slide_title(slide), 3200, true, false);

    let mut body = String::new();
    match slide {
        Slide::Bullets { bullets, .. } => {
            for bullet in bullets {
                body.push_str(&run_paragraph(bullet, 1800, false, true));
            }
        }
        Slide::Text { lines, .. } => {
            for line in lines {
                body.push_str(&run_paragraph(line, 1800, false, false));
            }
        }
        Slide::Title { .. } | Slide::Image { .. } => {}
    }
    if body.is_empty() {
        body.push_str("<a:p/>");
    }

    slide_xml(&[
        text_shape(2, "Title", 274638, 1143000, &title),
        text_shape(3, "Body", 1600200, 4525963, &body),
    ])
}

fn slide_xml(shapes: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
<p:cSld><p:spTree>{EMPTY_GROUP}{}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>\
</p:sld>",
        shapes.concat()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_deck() -> DeckDocument {
        let mut front_matter = BTreeMap::new();
        front_matter.insert("size".to_string(), "16:9".to_string());
        DeckDocument {
            front_matter,
            slides: vec![
                Slide::Text {
                    title: "Test Paper".into(),
                    lines: vec![],
                    notes: None,
                },
                Slide::Bullets {
                    title: "Points".into(),
                    bullets: vec!["one".into(), "two".into()],
                    notes: None,
                },
            ],
        }
    }

    #[test]
    fn package_contains_expected_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        write_pptx(&sample_deck(), &path).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide3.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }
        // title slide + 2 units, no slide4
        assert!(archive.by_name("ppt/slides/slide4.xml").is_err());
    }

    #[test]
    fn sixteen_nine_size_is_applied() {
        let xml = presentation(3, SIZE_16_9.0, SIZE_16_9.1);
        assert!(xml.contains("cx=\"12192000\" cy=\"6858000\""));
    }

    #[test]
    fn deck_title_falls_back_to_first_unit_heading() {
        let deck = sample_deck();
        assert_eq!(deck_title(&deck), "Test Paper");

        let mut with_fm = deck.clone();
        with_fm
            .front_matter
            .insert("title".to_string(), "Front Matter Title".to_string());
        assert_eq!(deck_title(&with_fm), "Front Matter Title");
    }

    #[test]
    fn xml_text_is_escaped() {
        let p = run_paragraph("a < b & c", 1800, false, false);
        assert!(p.contains("a &lt; b &amp; c"));
    }
}
