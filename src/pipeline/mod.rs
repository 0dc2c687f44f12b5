//! Pipeline stages for PDF-to-slide conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ metadata ──┬──▶ summarize ──▶ merged record
//!  (path)   (lopdf)    │     (LLM)
//!                      ├──▶ images    (lopdf + image)
//!                      └──▶ preview   (pdfium crop)
//! ```
//!
//! 1. [`input`]     — validate the user-supplied path and PDF magic bytes
//! 2. [`metadata`]  — Info-dictionary fields plus a leading-pages text proxy;
//!    absent (not an error) when the document is unreadable
//! 3. [`images`]    — recover embedded raster images subject to filters,
//!    deduplicated by cross-reference id
//! 4. [`preview`]   — rasterise page one and crop the title/author band;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 5. [`summarize`] — the only stage with network I/O; parses the free-form
//!    reply into a fixed schema with per-field sentinels

pub mod images;
pub mod input;
pub mod metadata;
pub mod preview;
pub mod summarize;
