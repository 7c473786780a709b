//! Core trait definitions for LLM providers and the two session gateways.
//!
//! `LlmProvider` is implemented by the `quizcoach-providers` crate. The
//! gateway traits are what the session controller depends on; the
//! production implementation lives in [`crate::gateway`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{FeedbackFailure, GenerationFailure};
use crate::model::{Difficulty, FeedbackData, QuizData, WrongAnswer};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that complete prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Complete a prompt.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to complete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Ask the backend for a JSON document when it supports it.
    #[serde(default)]
    pub json_response: bool,
}

/// Response from an LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for a single completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Session gateways
// ---------------------------------------------------------------------------

/// Produces a quiz from a study corpus.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate_quiz(
        &self,
        content: &str,
        difficulty: Difficulty,
    ) -> Result<QuizData, GenerationFailure>;
}

/// Produces coach feedback and remediation flashcards from a scored quiz.
#[async_trait]
pub trait FeedbackSynthesizer: Send + Sync {
    async fn synthesize_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackData, FeedbackFailure>;
}

/// Everything the feedback gateway needs to know about a finished quiz.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub name: String,
    pub score: usize,
    pub total: usize,
    pub wrong_answers: Vec<WrongAnswer>,
    pub difficulty: Difficulty,
}

// ---------------------------------------------------------------------------
// Default system prompt
// ---------------------------------------------------------------------------

/// Default system prompt for quiz and feedback generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an educational game engine. Respond ONLY with a single JSON document matching the requested structure. Do not add explanations or markdown.";

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON document from an LLM response.
///
/// Handles:
/// - ```json``` blocks (the first one wins)
/// - Generic ``` blocks (if no json-specific block found)
/// - Prose around a bare object (outermost `{` … `}`)
/// - A clean JSON response (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what we have
    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_blocks.push(current_block);
        } else if is_generic_block {
            generic_blocks.push(current_block);
        }
    }

    if let Some(block) = json_blocks.into_iter().next() {
        return block.trim().to_string();
    }
    if let Some(block) = generic_blocks.into_iter().next() {
        return block.trim().to_string();
    }

    let trimmed = response.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_is_returned_as_is() {
        let input = r#"  {"feedback": "ok", "flashcards": []}  "#;
        assert_eq!(
            extract_json_from_markdown(input),
            r#"{"feedback": "ok", "flashcards": []}"#
        );
    }

    #[test]
    fn extract_json_block() {
        let input = "Sure!\n\n```json\n{\"a\": 1}\n```\n\nEnjoy.";
        assert_eq!(extract_json_from_markdown(input), "{\"a\": 1}");
    }

    #[test]
    fn extract_generic_block_fallback() {
        let input = "```\n{\"b\": 2}\n```";
        assert_eq!(extract_json_from_markdown(input), "{\"b\": 2}");
    }

    #[test]
    fn extract_prefers_json_over_generic() {
        let input = "```\n{\"generic\": true}\n```\n\n```json\n{\"json\": true}\n```\n";
        assert_eq!(extract_json_from_markdown(input), "{\"json\": true}");
    }

    #[test]
    fn extract_bare_object_from_prose() {
        let input = "Here is the quiz: {\"questions\": []} Good luck!";
        assert_eq!(extract_json_from_markdown(input), "{\"questions\": []}");
    }

    #[test]
    fn extract_truncated_unclosed_block() {
        let input = "```json\n{\"questions\": [";
        assert_eq!(extract_json_from_markdown(input), "{\"questions\": [");
    }
}
