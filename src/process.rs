//! Orchestrator: the staged pipeline under one wall-clock budget.
//!
//! One [`Deadline`] is established per run; every stage is gated on the
//! remaining budget and fails fast with `TimeoutExceeded` when entered with
//! none left. CPU-bound PDF work runs in `spawn_blocking`; the summarisation
//! call and the external renderer are additionally bounded by the remaining
//! duration. No stage retries, and no partial/resumable state is kept — the
//! first error is the terminal state of the run.

use crate::config::{PipelineConfig, ProcessRequest};
use crate::deadline::Deadline;
use crate::error::Pdf2MarpError;
use crate::export;
use crate::paperxml;
use crate::pipeline::images::{self, ExtractedImage};
use crate::pipeline::{input, metadata, preview, summarize};
use crate::record::{sanitize_component, sanitize_path, ImageCount, ImageEntry, PaperRecord};
use crate::slides::generate;
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used when neither the config nor the environment names one.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Stage timings and counters for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessStats {
    pub image_count: usize,
    pub abstract_chars: usize,
    pub metadata_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub preview_duration_ms: u64,
    pub summary_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    pub record: PaperRecord,
    pub record_dir: PathBuf,
    pub record_path: PathBuf,
    pub markup_path: PathBuf,
    pub stats: ProcessStats,
}

/// Run the full pipeline: PDF → record → `paper.xml` → Marp markup.
///
/// Exports are separate terminal calls — see [`export_presentation_file`]
/// and [`export_deck_file`].
pub async fn process(
    request: &ProcessRequest,
    config: &PipelineConfig,
) -> Result<ProcessOutput, Pdf2MarpError> {
    let deadline = Deadline::new(request.timeout_secs);
    let total_start = Instant::now();
    info!("Starting pipeline: {}", request.pdf_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    deadline.check("resolve-input")?;
    let pdf_path = input::resolve_input(&request.pdf_path)?;

    // ── Step 2: Resolve LLM provider ─────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Read metadata ────────────────────────────────────────────
    deadline.check("read-metadata")?;
    let metadata_start = Instant::now();
    let meta = {
        let path = pdf_path.clone();
        let pages = config.abstract_pages;
        let max_chars = config.abstract_max_chars;
        tokio::task::spawn_blocking(move || metadata::read_metadata(&path, pages, max_chars))
            .await
            .map_err(|e| Pdf2MarpError::Internal(format!("Metadata task panicked: {e}")))?
    };
    let Some(meta) = meta else {
        return Err(Pdf2MarpError::MetadataUnavailable { path: pdf_path });
    };
    let metadata_duration_ms = metadata_start.elapsed().as_millis() as u64;
    debug!("Metadata: title={:?}", meta.title);

    // ── Step 4: Lay out output directories ───────────────────────────────
    let out_dir = sanitize_path(&request.output_dir);
    let entry_id = PaperRecord::entry_id_from(&pdf_path);
    let record_dir = out_dir.join("xmls").join(&entry_id);
    let images_dir = record_dir.join("images");

    // ── Step 5: Extract embedded images ──────────────────────────────────
    deadline.check("extract-images")?;
    let extract_start = Instant::now();
    let extracted = {
        let path = pdf_path.clone();
        let dir = images_dir.clone();
        let filter = config.image_filter.clone();
        tokio::task::spawn_blocking(move || images::extract_images(&path, &dir, &filter))
            .await
            .map_err(|e| Pdf2MarpError::Internal(format!("Extract task panicked: {e}")))??
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!("Extracted {} image(s) in {}ms", extracted.len(), extract_duration_ms);

    // ── Step 6: First-page preview crop ──────────────────────────────────
    deadline.check("render-preview")?;
    let preview_start = Instant::now();
    let half_path = preview::render_preview(&pdf_path, &images_dir).await?;
    let preview_duration_ms = preview_start.elapsed().as_millis() as u64;

    // ── Step 7: Summarise ────────────────────────────────────────────────
    let summary_start = Instant::now();
    let summary =
        summarize::summarize(&provider, &meta.title, &meta.abstract_text, config, &deadline)
            .await?;
    let summary_duration_ms = summary_start.elapsed().as_millis() as u64;

    // ── Step 8: Merge and persist the record ─────────────────────────────
    deadline.check("save-record")?;
    let abstract_chars = meta.abstract_text.chars().count();
    let record = build_record(
        meta,
        summary,
        &extracted,
        &images_dir,
        Some(half_path.as_path()),
        entry_id,
    );
    let record_path = record_dir.join(generate::RECORD_FILE_NAME);
    paperxml::save_record(&record, &record_path)?;

    // ── Step 9: Generate the slide markup ────────────────────────────────
    deadline.check("generate-markup")?;
    let marp_dir = out_dir.join("output_marp");
    let markup_path = generate::generate_markup(&record_dir, &marp_dir, config.min_slide_image_kb)?;

    let stats = ProcessStats {
        image_count: record.image_count.image.len(),
        abstract_chars,
        metadata_duration_ms,
        extract_duration_ms,
        preview_duration_ms,
        summary_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Pipeline complete: {} image(s), {}ms total → {}",
        stats.image_count, stats.total_duration_ms, markup_path.display()
    );

    Ok(ProcessOutput {
        record,
        record_dir,
        record_path,
        markup_path,
        stats,
    })
}

/// Merge reader, extractor, and summariser outputs into one record, with
/// every path-valued field whitespace-sanitised.
pub fn build_record(
    meta: metadata::PaperMetadata,
    summary: summarize::Summary,
    extracted: &[ExtractedImage],
    images_dir: &Path,
    half_path: Option<&Path>,
    entry_id: String,
) -> PaperRecord {
    let images = extracted
        .iter()
        .map(|img| sanitize_component(&images_dir.join(&img.name).to_string_lossy()))
        .collect();
    let entries = extracted
        .iter()
        .map(|img| ImageEntry::new(img.name.clone(), img.page, img.width, img.height))
        .collect();

    PaperRecord {
        title: meta.title,
        title_jp: summary.title_jp,
        authors: meta.authors,
        abstract_text: meta.abstract_text,
        keywords: summary.keywords,
        problem: summary.problem,
        method: summary.method,
        result: summary.result,
        year: None,
        entry_id,
        pdf_path: sanitize_component(&meta.pdf_path.to_string_lossy()),
        image_count: ImageCount::new(entries),
        images,
        half_img_path: half_path.map(|p| sanitize_component(&p.to_string_lossy())),
    }
}

/// Replace exactly the record's title and rewrite the document.
///
/// The one supported post-creation mutation; call before regenerating the
/// markup when the extracted title needs a human fix.
pub fn update_title(record_path: &Path, new_title: &str) -> Result<PaperRecord, Pdf2MarpError> {
    paperxml::update_title(record_path, new_title)
}

/// Export the markup file as a rendered presentation, next to the markup
/// file unless `output_dir` says otherwise. Returns the collision-avoided
/// output path.
pub async fn export_presentation_file(
    markup_path: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    timeout_secs: u64,
) -> Result<PathBuf, Pdf2MarpError> {
    let deadline = Deadline::new(timeout_secs);
    let out_path = export::unique_output_path(output_dir, &markup_stem(markup_path), "pdf");
    export::presentation::export_presentation(
        markup_path,
        &out_path,
        &config.marp_command,
        &deadline,
    )
    .await?;
    Ok(out_path)
}

/// Export the markup file as a `.pptx` deck. Returns the collision-avoided
/// output path.
pub fn export_deck_file(
    markup_path: &Path,
    output_dir: &Path,
    timeout_secs: u64,
) -> Result<PathBuf, Pdf2MarpError> {
    let deadline = Deadline::new(timeout_secs);
    let out_path = export::unique_output_path(output_dir, &markup_stem(markup_path), "pptx");
    export::deck::export_deck(markup_path, &out_path, &deadline)?;
    Ok(out_path)
}

fn markup_stem(markup_path: &Path) -> String {
    markup_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; used as-is. Useful in tests or
///    when the caller needs custom middleware.
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key from the environment via the provider factory.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`) —
///    honoured before full auto-detection so an execution-environment model
///    choice wins even when multiple API keys are present.
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — scans all
///    known API key variables and picks the first available provider.
fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, Pdf2MarpError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2MarpError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2MarpError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2MarpError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
