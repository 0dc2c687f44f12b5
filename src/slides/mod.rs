//! The slide document model and its Marp rendering.
//!
//! A [`SlideDocument`] is a pure, regenerable view derived from a
//! [`crate::record::PaperRecord`] — it has no persistence of its own beyond
//! the rendered markup file. The same model is what the deck exporter
//! reconstructs when it parses markup back (see [`crate::export::deck`]).

pub mod generate;

/// One slide. Image slides carry a pre-computed display width; text-bearing
/// slides carry either paragraphs or bullet points, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Slide {
    /// The single leading title slide.
    Title { title: String },
    /// Paragraph slide.
    Text {
        title: String,
        lines: Vec<String>,
        notes: Option<String>,
    },
    /// Bullet-list slide.
    Bullets {
        title: String,
        bullets: Vec<String>,
        notes: Option<String>,
    },
    /// Single image scaled to `display_width` markup units.
    Image { path: String, display_width: u32 },
}

/// Ordered slides plus the front-matter directives they render under.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlideDocument {
    pub slides: Vec<Slide>,
}

/// Front matter: renderer flag, theme, aspect ratio, pagination, and a style
/// override allowing vertical overflow scrolling inside each slide region.
pub const FRONT_MATTER: &str = "---\n\
marp: true\n\
theme: default\n\
size: 16:9\n\
paginate: true\n\
_class: [\"cool-theme\"]\n\
style: |\n\
\x20 section {\n\
\x20   overflow-y: auto;\n\
\x20 }\n";

impl SlideDocument {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }

    /// Render the document as Marp markup.
    pub fn to_marp(&self) -> String {
        let mut out = String::from(FRONT_MATTER);

        for (i, slide) in self.slides.iter().enumerate() {
            out.push_str("\n---\n");
            match slide {
                Slide::Title { title } => {
                    out.push_str(&format!("# {title}\n"));
                }
                Slide::Text { title, lines, .. } => {
                    out.push_str("<!-- _class: title -->\n");
                    out.push_str(&format!("# {title}\n"));
                    for line in lines {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                Slide::Bullets { title, bullets, .. } => {
                    out.push_str(&format!("# {title}\n"));
                    for bullet in bullets {
                        out.push_str(&format!("- {bullet}\n"));
                    }
                }
                Slide::Image {
                    path,
                    display_width,
                } => {
                    out.push_str("<!-- _class: info -->\n");
                    out.push_str(&format!("![width:{display_width}]({path})\n"));
                }
            }
            if i == 0 {
                out.push('\n');
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marp_output_opens_with_front_matter() {
        let doc = SlideDocument::new(vec![Slide::Title {
            title: "A Paper".into(),
        }]);
        let md = doc.to_marp();
        assert!(md.starts_with("---\nmarp: true\n"));
        assert!(md.contains("overflow-y: auto;"));
        assert!(md.contains("\n---\n# A Paper\n"));
    }

    #[test]
    fn image_slides_carry_class_and_width() {
        let doc = SlideDocument::new(vec![
            Slide::Title { title: "T".into() },
            Slide::Image {
                path: "../imgs/fig.png".into(),
                display_width: 1400,
            },
        ]);
        let md = doc.to_marp();
        assert!(md.contains("<!-- _class: info -->\n![width:1400](../imgs/fig.png)\n"));
    }
}
