//! # pdf2marp
//!
//! Summarise an academic PDF into a one-page Marp slide deck, then export it
//! as a rendered presentation and a `.pptx` deck.
//!
//! ## Why this crate?
//!
//! Skimming a paper means finding the title block, the contribution, and the
//! key figures. This crate automates exactly that: it pulls the metadata and
//! large embedded figures out of the PDF, asks an LLM for a fixed five-field
//! summary, and lays both out as a deterministic slide deck — one title
//! slide, one detail slide, one slide per qualifying figure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate path + %PDF magic
//!  ├─ 2. Metadata   Info dict + leading-pages abstract proxy (lopdf)
//!  ├─ 3. Images     embedded rasters, xref-deduplicated + filtered (lopdf)
//!  ├─ 4. Preview    first-page 2× render, title-band crop (pdfium)
//!  ├─ 5. Summarise  one LLM call → five labelled fields, "N/A" sentinels
//!  ├─ 6. Record     merged paper.xml (round-trip safe, title editable)
//!  ├─ 7. Markup     Marp slide document with deterministic layout
//!  └─ 8. Export     marp CLI render · in-process .pptx writer
//! ```
//!
//! Every stage runs under one shared wall-clock budget: the remaining
//! duration is propagated into each stage, which fails fast with a timeout
//! error rather than starting work it cannot finish.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2marp::{process, PipelineConfig, ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = PipelineConfig::default();
//!     let request = ProcessRequest::new("paper.pdf", "./output", 60);
//!     let output = process(&request, &config).await?;
//!     println!("markup: {}", output.markup_path.display());
//!     eprintln!("{} images, {}ms", output.stats.image_count,
//!         output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2marp` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2marp = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deadline;
pub mod error;
pub mod export;
pub mod paperxml;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod record;
pub mod slides;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImageFilter, PipelineConfig, PipelineConfigBuilder, ProcessRequest};
pub use deadline::Deadline;
pub use error::Pdf2MarpError;
pub use pipeline::metadata::{read_metadata, PaperMetadata};
pub use process::{
    export_deck_file, export_presentation_file, process, update_title, ProcessOutput,
    ProcessStats,
};
pub use record::PaperRecord;
pub use slides::{Slide, SlideDocument};
