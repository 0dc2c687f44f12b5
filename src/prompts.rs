//! Prompts and the label table for paper summarisation.
//!
//! Centralising these here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the field constraints or adding
//!    a label means editing exactly one place.
//!
//! 2. **Testability** — the reply parser and its label table can be exercised
//!    without a live LLM call.
//!
//! Callers can override the system prompt via
//! [`crate::config::PipelineConfig::summary_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt: constrain the reply to five Japanese-labelled
/// fields of at most 180 characters each.
pub const DEFAULT_SUMMARY_PROMPT: &str = "\
与えられた論文の要点をまとめ、以下の項目で日本語で出力せよ。それぞれの項目は最大でも180文字以内に要約せよ。
```
論文名:タイトルの日本語訳
キーワード:この論文のキーワード
課題:この論文が解決する課題
手法:この論文が提案する手法
結果:提案手法によって得られた結果
```";

/// Summary fields a labelled reply line can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    TitleJp,
    Keywords,
    Problem,
    Method,
    Result,
}

/// Recognised line prefixes and the fields they populate. Lines matching no
/// prefix are ignored; fields never populated fall back to the sentinel.
pub const SUMMARY_LABELS: &[(&str, SummaryField)] = &[
    ("論文名", SummaryField::TitleJp),
    ("キーワード", SummaryField::Keywords),
    ("課題", SummaryField::Problem),
    ("手法", SummaryField::Method),
    ("結果", SummaryField::Result),
];

/// Build the user message for a summarisation call.
pub fn summary_user_message(title: &str, abstract_text: &str) -> String {
    format!("title: {title}\nbody: {abstract_text}")
}
