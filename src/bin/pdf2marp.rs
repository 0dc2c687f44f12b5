//! CLI binary for pdf2marp.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`/`ProcessRequest` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2marp::slides::generate;
use pdf2marp::{
    export_deck_file, export_presentation_file, process, read_metadata, update_title,
    PipelineConfig, ProcessOutput, ProcessRequest,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a paper into ./output
  pdf2marp paper.pdf

  # Custom output directory and a 2-minute budget
  pdf2marp paper.pdf -o ~/slides --timeout 120

  # Fix a garbled extracted title before the markup is generated
  pdf2marp paper.pdf --title "Attention Is All You Need"

  # Also render the deck with the Marp CLI and write a .pptx
  pdf2marp paper.pdf --export all

  # Inspect PDF metadata (no API key needed)
  pdf2marp --inspect-only paper.pdf

OUTPUT LAYOUT:
  {output_dir}/xmls/{entry_id}/paper.xml     intermediate record
  {output_dir}/xmls/{entry_id}/images/*      extracted figures + half.png
  {output_dir}/output_marp/{title}_output.md slide markup
  exports land next to the markup file, numbered on collision

ENVIRONMENT VARIABLES:
  OUTPUT_DIR              Default output directory
  TIMEOUT_SEC             Default wall-clock budget in seconds
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  A .env file in the working directory is loaded first.

SETUP:
  1. Set API key:      export OPENAI_API_KEY=sk-...
  2. Install marp CLI: npm install -g @marp-team/marp-cli   (for --export pdf)
  3. Run:              pdf2marp paper.pdf
"#;

/// Summarise academic PDFs into one-page Marp slide decks.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2marp",
    version,
    about = "Summarise academic PDFs into one-page Marp slide decks",
    long_about = "Extract metadata, figures, and a first-page preview from an academic PDF, \
summarise it with an LLM, and lay everything out as a Marp slide deck with optional \
presentation (marp CLI) and .pptx exports.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Output directory root.
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "./output")]
    output_dir: PathBuf,

    /// Total wall-clock budget in seconds, shared by every stage.
    #[arg(long, env = "TIMEOUT_SEC", default_value_t = 60)]
    timeout: u64,

    /// Replace the extracted title before the markup is generated.
    #[arg(long)]
    title: Option<String>,

    /// Exports to run after the markup is generated.
    #[arg(long, value_enum, default_value = "none")]
    export: ExportArg,

    /// LLM model ID (e.g. gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Minimum on-disk KB for an extracted image to earn a slide.
    #[arg(long, default_value_t = 100)]
    min_size_kb: u64,

    /// External slide-renderer command.
    #[arg(long, default_value = "marp")]
    marp_command: String,

    /// Output structured JSON instead of the human summary.
    #[arg(long)]
    json: bool,

    /// Print PDF metadata only, no processing.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportArg {
    None,
    Pdf,
    Pptx,
    All,
}

/// Everything one invocation produced, for `--json`.
#[derive(Debug, Serialize)]
struct RunReport {
    #[serde(flatten)]
    output: ProcessOutput,
    presentation_path: Option<PathBuf>,
    deck_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; it
    // provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = read_metadata(&cli.input, 3, 2000)
            .with_context(|| format!("Could not read metadata from {:?}", cli.input))?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&meta)?);
        } else {
            println!("File:       {}", cli.input.display());
            println!("Title:      {}", meta.title);
            println!("Authors:    {}", meta.authors.join("; "));
            println!("Subject:    {}", meta.subject);
            if let Some(ref p) = meta.producer {
                println!("Producer:   {}", p);
            }
            if let Some(ref d) = meta.creation_date {
                println!("Created:    {}", d);
            }
            if let Some(ref d) = meta.modification_date {
                println!("Modified:   {}", d);
            }
            println!("Abstract:   {} chars", meta.abstract_text.chars().count());
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = PipelineConfig::builder()
        .min_slide_image_kb(cli.min_size_kb)
        .marp_command(cli.marp_command.clone());
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let request = ProcessRequest::new(cli.input.clone(), cli.output_dir.clone(), cli.timeout);

    // ── Run the pipeline ─────────────────────────────────────────────────
    let spinner = show_progress.then(|| stage_spinner(cli.timeout));
    let result = process(&request, &config).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let mut output = result.context("Processing failed")?;

    // ── Optional title edit, then regenerate the markup ──────────────────
    if let Some(ref new_title) = cli.title {
        output.record = update_title(&output.record_path, new_title)
            .context("Title update failed")?;
        let marp_dir = output
            .markup_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.output_dir.join("output_marp"));
        let regenerated = generate::generate_markup(&output.record_dir, &marp_dir, cli.min_size_kb)
            .context("Markup regeneration failed")?;
        if regenerated != output.markup_path {
            std::fs::remove_file(&output.markup_path).ok();
        }
        output.markup_path = regenerated;
    }

    // ── Exports ──────────────────────────────────────────────────────────
    let export_dir = output
        .markup_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| cli.output_dir.clone());

    let presentation_path = if matches!(cli.export, ExportArg::Pdf | ExportArg::All) {
        let spinner = show_progress.then(|| export_spinner("presentation"));
        let path =
            export_presentation_file(&output.markup_path, &export_dir, &config, cli.timeout)
                .await;
        if let Some(ref bar) = spinner {
            bar.finish_and_clear();
        }
        Some(path.context("Presentation export failed")?)
    } else {
        None
    };

    let deck_path = if matches!(cli.export, ExportArg::Pptx | ExportArg::All) {
        Some(
            export_deck_file(&output.markup_path, &export_dir, cli.timeout)
                .context("Deck export failed")?,
        )
    } else {
        None
    };

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let report = RunReport {
            output,
            presentation_path,
            deck_path,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&output.record.title),
            dim(&format!("({}ms)", stats.total_duration_ms)),
        );
        eprintln!(
            "   {} image(s)  ·  record {}  ·  summary {}",
            stats.image_count,
            dim(&format!("{}ms", stats.metadata_duration_ms + stats.extract_duration_ms)),
            dim(&format!("{}ms", stats.summary_duration_ms)),
        );
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", output.markup_path.display()).ok();
        if let Some(ref p) = presentation_path {
            eprintln!("   {} {}", cyan("presentation"), p.display());
        }
        if let Some(ref p) = deck_path {
            eprintln!("   {} {}", cyan("deck"), p.display());
        }
    }

    Ok(())
}

/// Spinner shown while the pipeline runs, with the budget in the prefix.
fn stage_spinner(timeout_secs: u64) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Processing");
    bar.set_message(format!("budget {timeout_secs}s"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn export_spinner(what: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  ⏱ {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(format!("Exporting {what}"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
