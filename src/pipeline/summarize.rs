//! Summarizer: one LLM call, parsed into a fixed five-field schema.
//!
//! The network call is the only stage with real I/O and is bounded by the
//! remaining pipeline budget; its failure is a hard stage failure (no retry,
//! no defaulting). The reply, however, is unconstrained natural language, so
//! parsing is best-effort: a line-oriented pass over a fixed
//! prefix-to-field table. Unmatched lines are ignored and unresolved fields
//! default to the `"N/A"` sentinel — a missing label is never an error.

use crate::config::PipelineConfig;
use crate::deadline::Deadline;
use crate::error::Pdf2MarpError;
use crate::prompts::{summary_user_message, SummaryField, DEFAULT_SUMMARY_PROMPT, SUMMARY_LABELS};
use crate::record::NA;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::debug;

/// Parsed summarisation fields. Every field is present after parsing;
/// absent ones carry the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub title_jp: String,
    pub keywords: String,
    pub problem: String,
    pub method: String,
    pub result: String,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            title_jp: NA.to_string(),
            keywords: NA.to_string(),
            problem: NA.to_string(),
            method: NA.to_string(),
            result: NA.to_string(),
        }
    }
}

/// Summarise `title` + `abstract_text` under the remaining budget.
pub async fn summarize(
    provider: &Arc<dyn LLMProvider>,
    title: &str,
    abstract_text: &str,
    config: &PipelineConfig,
    deadline: &Deadline,
) -> Result<Summary, Pdf2MarpError> {
    let budget = deadline.check("summarize")?;

    let system_prompt = config
        .summary_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SUMMARY_PROMPT);
    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(summary_user_message(title, abstract_text)),
    ];
    let options = CompletionOptions {
        temperature: Some(config.temperature),
        ..Default::default()
    };

    let response = tokio::time::timeout(budget, provider.chat(&messages, Some(&options)))
        .await
        .map_err(|_| Pdf2MarpError::TimeoutExceeded {
            stage: "summarize".to_string(),
            budget_secs: deadline.budget_secs(),
        })?
        .map_err(|e| Pdf2MarpError::LlmApiError {
            message: e.to_string(),
        })?;

    debug!(
        "Summary reply: {} input / {} output tokens",
        response.prompt_tokens, response.completion_tokens
    );
    Ok(parse_summary(&response.content))
}

/// Parse a free-form reply against [`SUMMARY_LABELS`].
///
/// The value is the remainder of a matching line after its label and an
/// optional `:`/`：` separator, trimmed. Repeated labels: last one wins.
pub fn parse_summary(reply: &str) -> Summary {
    let mut summary = Summary::default();

    for raw in reply.lines() {
        let line = raw.trim();
        for (label, field) in SUMMARY_LABELS {
            if let Some(rest) = line.strip_prefix(label) {
                let value = rest.trim_start_matches([':', '：']).trim().to_string();
                match field {
                    SummaryField::TitleJp => summary.title_jp = value,
                    SummaryField::Keywords => summary.keywords = value,
                    SummaryField::Problem => summary.problem = value,
                    SummaryField::Method => summary.method = value,
                    SummaryField::Result => summary.result = value,
                }
                break;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_reply_parses_all_fields() {
        let reply = "\
論文名:トランスフォーマー
キーワード:注意機構, 翻訳
課題:再帰モデルは並列化できない
手法:自己注意のみで系列変換を行う
結果:翻訳タスクで最高精度を達成";
        let s = parse_summary(reply);
        assert_eq!(s.title_jp, "トランスフォーマー");
        assert_eq!(s.keywords, "注意機構, 翻訳");
        assert_eq!(s.problem, "再帰モデルは並列化できない");
        assert_eq!(s.method, "自己注意のみで系列変換を行う");
        assert_eq!(s.result, "翻訳タスクで最高精度を達成");
    }

    #[test]
    fn missing_fields_default_to_sentinel() {
        let s = parse_summary("論文名:何か\nここは無関係な行です\n");
        assert_eq!(s.title_jp, "何か");
        assert_eq!(s.keywords, "N/A");
        assert_eq!(s.problem, "N/A");
        assert_eq!(s.method, "N/A");
        assert_eq!(s.result, "N/A");
    }

    #[test]
    fn empty_reply_is_all_sentinels() {
        assert_eq!(parse_summary(""), Summary::default());
    }

    #[test]
    fn fullwidth_separator_and_padding_are_stripped() {
        let s = parse_summary("キーワード： 画像認識 \n課題:  認識精度  ");
        assert_eq!(s.keywords, "画像認識");
        assert_eq!(s.problem, "認識精度");
    }

    #[test]
    fn repeated_label_last_wins() {
        let s = parse_summary("手法:最初\n手法:二番目");
        assert_eq!(s.method, "二番目");
    }
}
