//! LLM-backed implementation of the two session gateways.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::{FeedbackFailure, GenerationFailure};
use crate::model::{Difficulty, FeedbackData, QuizData};
use crate::prompt::{build_feedback_prompt, build_quiz_prompt, PromptSettings};
use crate::schema::{parse_feedback_response, parse_quiz_response};
use crate::traits::{
    CompletionRequest, FeedbackRequest, FeedbackSynthesizer, LlmProvider, QuizGenerator,
    DEFAULT_SYSTEM_PROMPT,
};

/// Model and sampling settings for gateway calls.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub model: String,
    pub quiz_temperature: f64,
    pub feedback_temperature: f64,
    pub max_tokens: u32,
    /// Optional system prompt override.
    pub system_prompt: Option<String>,
    pub prompt: PromptSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            quiz_temperature: 0.7,
            feedback_temperature: 0.8,
            max_tokens: 8192,
            system_prompt: None,
            prompt: PromptSettings::default(),
        }
    }
}

/// Quiz generator and feedback synthesizer over any [`LlmProvider`].
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    settings: GatewaySettings,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GatewaySettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    fn request(&self, prompt: String, temperature: f64) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            prompt,
            system_prompt: Some(
                self.settings
                    .system_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ),
            max_tokens: self.settings.max_tokens,
            temperature,
            json_response: true,
        }
    }
}

#[async_trait]
impl QuizGenerator for LlmGateway {
    #[instrument(
        skip(self, content),
        fields(provider = self.provider.name(), model = %self.settings.model)
    )]
    async fn generate_quiz(
        &self,
        content: &str,
        difficulty: Difficulty,
    ) -> Result<QuizData, GenerationFailure> {
        let prompt = build_quiz_prompt(content, difficulty, &self.settings.prompt);
        let request = self.request(prompt, self.settings.quiz_temperature);

        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| GenerationFailure::Provider(format!("{e:#}")))?;
        tracing::info!(
            latency_ms = response.latency_ms,
            tokens = response.token_usage.total_tokens,
            "quiz response received"
        );

        parse_quiz_response(&response.content).inspect_err(|e| {
            tracing::warn!(error = %e, "quiz response rejected");
        })
    }
}

#[async_trait]
impl FeedbackSynthesizer for LlmGateway {
    #[instrument(
        skip(self, request),
        fields(
            provider = self.provider.name(),
            score = request.score,
            wrong = request.wrong_answers.len()
        )
    )]
    async fn synthesize_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackData, FeedbackFailure> {
        let prompt = build_feedback_prompt(request, &self.settings.prompt);
        let completion = self.request(prompt, self.settings.feedback_temperature);

        let response = self
            .provider
            .complete(&completion)
            .await
            .map_err(|e| FeedbackFailure::Provider(format!("{e:#}")))?;
        tracing::info!(latency_ms = response.latency_ms, "feedback response received");

        parse_feedback_response(&response.content)
    }
}
