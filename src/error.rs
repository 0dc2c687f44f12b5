//! Error types for the pdf2marp library.
//!
//! One enum covers every fatal failure of a pipeline run. Two conditions are
//! deliberately *not* errors:
//!
//! * A summarisation reply missing one or more labelled fields — absorbed
//!   per-field with the `"N/A"` sentinel (see [`crate::pipeline::summarize`]).
//! * An unreadable or undecryptable PDF at metadata time — signalled as an
//!   absent result (`Ok(None)`) from the reader so the caller must branch
//!   explicitly rather than catch.
//!
//! Everything else propagates unwound to the orchestrator, which reports it
//! as the terminal state of the run. No automatic retries anywhere.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2marp library.
#[derive(Debug, Error)]
pub enum Pdf2MarpError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required input file or directory was not found.
    #[error("Not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Document metadata could not be read (unparsable or undecryptable PDF).
    ///
    /// The metadata reader itself returns `Ok(None)` for this condition;
    /// the orchestrator converts that into this error because a record
    /// cannot be built without metadata.
    #[error("Could not read metadata from '{path}' (unreadable or encrypted PDF)")]
    MetadataUnavailable { path: PathBuf },

    /// First-page preview rasterisation failed.
    #[error("Preview render failed: {detail}")]
    PreviewFailed { detail: String },

    // ── Budget errors ─────────────────────────────────────────────────────
    /// The wall-clock budget ran out before or during a stage.
    #[error("Timed out during '{stage}' (total budget {budget_secs}s)")]
    TimeoutExceeded { stage: String, budget_secs: u64 },

    // ── Upstream-call errors ──────────────────────────────────────────────
    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The summarisation API call returned an error. Not retried.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// An export converter failed to launch or exited non-zero.
    #[error("Export via '{tool}' failed: {detail}")]
    ExportFailed { tool: String, detail: String },

    // ── Record errors ─────────────────────────────────────────────────────
    /// The intermediate record could not be serialised or parsed.
    #[error("Record error: {detail}")]
    RecordError { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_stage_and_budget() {
        let e = Pdf2MarpError::TimeoutExceeded {
            stage: "summarize".into(),
            budget_secs: 60,
        };
        let msg = e.to_string();
        assert!(msg.contains("summarize"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
    }

    #[test]
    fn not_found_display() {
        let e = Pdf2MarpError::NotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }

    #[test]
    fn export_failed_display() {
        let e = Pdf2MarpError::ExportFailed {
            tool: "marp".into(),
            detail: "exit status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("marp"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn metadata_unavailable_display() {
        let e = Pdf2MarpError::MetadataUnavailable {
            path: PathBuf::from("enc.pdf"),
        };
        assert!(e.to_string().contains("enc.pdf"));
    }
}
