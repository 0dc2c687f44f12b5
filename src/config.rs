//! Configuration types for the PDF-to-slide pipeline.
//!
//! All tunables live in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! The per-run inputs (which PDF, where to write, how long the run may take)
//! are a separate immutable [`ProcessRequest`] value passed into the
//! orchestrator — stages never reach into ambient process state for them.

use crate::error::Pdf2MarpError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One pipeline run: which PDF, where outputs go, total wall-clock budget.
///
/// Immutable by construction; the orchestrator returns a result and never
/// mutates caller state.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// Path to the source PDF.
    pub pdf_path: PathBuf,
    /// Root output directory. `xmls/` and `output_marp/` are created below it.
    pub output_dir: PathBuf,
    /// Total wall-clock budget in seconds, shared by every stage.
    pub timeout_secs: u64,
}

impl ProcessRequest {
    pub fn new(
        pdf_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            output_dir: output_dir.into(),
            timeout_secs,
        }
    }
}

/// Filter parameters for embedded-image extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFilter {
    /// Minimum pixel width. An image is dropped only when BOTH dimensions
    /// are under their minima; either one alone reaching its minimum keeps it.
    pub min_width: u32,
    /// Minimum pixel height (see `min_width` for the combination rule).
    pub min_height: u32,
    /// Recovered images at or below this many bytes are dropped
    /// (filters out trivial/blank fills).
    pub min_bytes: usize,
    /// Maximum of width:height and height:width. Anything more extreme is
    /// dropped (filters out rules and banners).
    pub max_aspect_ratio: f32,
    /// Extraction stops as soon as this many images have been collected.
    pub max_images: usize,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            min_width: 400,
            min_height: 400,
            min_bytes: 2048,
            max_aspect_ratio: 8.0,
            max_images: 5,
        }
    }
}

/// Configuration for a pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2marp::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .min_slide_image_kb(50)
///     .model("gpt-4o")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Embedded-image extraction filters.
    pub image_filter: ImageFilter,

    /// How many leading pages of text form the abstract proxy. Default: 3.
    pub abstract_pages: usize,

    /// Maximum characters kept from the concatenated page text. Default: 2000.
    ///
    /// The abstract proxy is only LLM context; anything past the first two
    /// thousand characters of an academic paper is past the abstract anyway
    /// and just costs input tokens.
    pub abstract_max_chars: usize,

    /// Minimum on-disk size in KB for an extracted image to earn its own
    /// slide. Default: 100.
    pub min_slide_image_kb: u64,

    /// LLM model identifier. If None, uses the provider default ("gpt-4o").
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the summarisation completion. Default: 0.25.
    pub temperature: f32,

    /// Custom summarisation system prompt. If None, uses the built-in default.
    pub summary_prompt: Option<String>,

    /// External slide-renderer command. Default: "marp".
    pub marp_command: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_filter: ImageFilter::default(),
            abstract_pages: 3,
            abstract_max_chars: 2000,
            min_slide_image_kb: 100,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.25,
            summary_prompt: None,
            marp_command: "marp".to_string(),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("image_filter", &self.image_filter)
            .field("abstract_pages", &self.abstract_pages)
            .field("abstract_max_chars", &self.abstract_max_chars)
            .field("min_slide_image_kb", &self.min_slide_image_kb)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("marp_command", &self.marp_command)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn min_image_width(mut self, px: u32) -> Self {
        self.config.image_filter.min_width = px;
        self
    }

    pub fn min_image_height(mut self, px: u32) -> Self {
        self.config.image_filter.min_height = px;
        self
    }

    pub fn min_image_bytes(mut self, bytes: usize) -> Self {
        self.config.image_filter.min_bytes = bytes;
        self
    }

    pub fn max_aspect_ratio(mut self, ratio: f32) -> Self {
        self.config.image_filter.max_aspect_ratio = ratio.max(1.0);
        self
    }

    pub fn max_images(mut self, n: usize) -> Self {
        self.config.image_filter.max_images = n.max(1);
        self
    }

    pub fn abstract_pages(mut self, n: usize) -> Self {
        self.config.abstract_pages = n.max(1);
        self
    }

    pub fn abstract_max_chars(mut self, n: usize) -> Self {
        self.config.abstract_max_chars = n;
        self
    }

    pub fn min_slide_image_kb(mut self, kb: u64) -> Self {
        self.config.min_slide_image_kb = kb;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.summary_prompt = Some(prompt.into());
        self
    }

    pub fn marp_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.marp_command = cmd.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Pdf2MarpError> {
        let c = &self.config;
        if c.image_filter.max_images == 0 {
            return Err(Pdf2MarpError::InvalidConfig(
                "max_images must be ≥ 1".into(),
            ));
        }
        if c.image_filter.max_aspect_ratio < 1.0 {
            return Err(Pdf2MarpError::InvalidConfig(format!(
                "max_aspect_ratio must be ≥ 1.0, got {}",
                c.image_filter.max_aspect_ratio
            )));
        }
        if c.marp_command.trim().is_empty() {
            return Err(Pdf2MarpError::InvalidConfig(
                "marp_command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
