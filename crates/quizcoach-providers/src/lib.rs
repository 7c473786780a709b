//! quizcoach-providers: LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for Gemini, Anthropic, OpenAI and
//! Ollama, plus the TOML configuration that selects between them.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, QuizcoachConfig};
pub use error::ProviderError;
