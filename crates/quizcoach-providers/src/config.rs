//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizcoach_core::gateway::GatewaySettings;
use quizcoach_core::prompt::PromptSettings;
use quizcoach_core::session::SessionSettings;
use quizcoach_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini { base_url, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Anthropic { base_url, .. } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                base_url, org_id, ..
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level quizcoach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizcoachConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature for quiz generation.
    #[serde(default = "default_quiz_temperature")]
    pub quiz_temperature: f64,
    /// Sampling temperature for coach feedback.
    #[serde(default = "default_feedback_temperature")]
    pub feedback_temperature: f64,
    /// Max tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Language questions and feedback are written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Study material beyond this many characters is not sent.
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,
    /// Start sessions with sound cues muted.
    #[serde(default)]
    pub muted: bool,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_quiz_temperature() -> f64 {
    0.7
}
fn default_feedback_temperature() -> f64 {
    0.8
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_language() -> String {
    "French".to_string()
}
fn default_content_char_limit() -> usize {
    800_000
}

impl Default for QuizcoachConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            quiz_temperature: default_quiz_temperature(),
            feedback_temperature: default_feedback_temperature(),
            max_tokens: default_max_tokens(),
            language: default_language(),
            content_char_limit: default_content_char_limit(),
            muted: false,
        }
    }
}

impl QuizcoachConfig {
    /// Gateway settings for `model`, or the configured default model.
    pub fn gateway_settings(&self, model: Option<&str>) -> GatewaySettings {
        GatewaySettings {
            model: model.unwrap_or(&self.default_model).to_string(),
            quiz_temperature: self.quiz_temperature,
            feedback_temperature: self.feedback_temperature,
            max_tokens: self.max_tokens,
            system_prompt: None,
            prompt: PromptSettings {
                language: self.language.clone(),
                content_char_limit: self.content_char_limit,
            },
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings { muted: self.muted }
    }

    /// Look up a configured provider by name.
    ///
    /// Ollama needs no credentials, so it resolves to the local default even
    /// when it is not configured.
    pub fn provider_config(&self, name: &str) -> Result<ProviderConfig> {
        if let Some(config) = self.providers.get(name) {
            return Ok(config.clone());
        }
        if name == "ollama" {
            return Ok(ProviderConfig::Ollama {
                base_url: default_ollama_url(),
            });
        }
        anyhow::bail!(
            "provider '{name}' is not configured. Add it to quizcoach.toml or set {}",
            key_env_var(name).unwrap_or("its API key")
        )
    }
}

/// Environment variable that overrides the API key of a provider.
fn key_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("QUIZCOACH_GEMINI_KEY"),
        "anthropic" => Some("QUIZCOACH_ANTHROPIC_KEY"),
        "openai" => Some("QUIZCOACH_OPENAI_KEY"),
        _ => None,
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    let resolve_url = |u: &Option<String>| u.as_deref().map(resolve_env_vars);
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_url(base_url),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_url(base_url),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_url(base_url),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Overwrite API keys from `lookup`, adding hosted providers that are missing.
fn apply_key_overrides(config: &mut QuizcoachConfig, lookup: impl Fn(&str) -> Option<String>) {
    for name in ["gemini", "anthropic", "openai"] {
        let Some(key) = key_env_var(name).and_then(&lookup) else {
            continue;
        };
        let entry = config
            .providers
            .entry(name.to_string())
            .or_insert_with(|| match name {
                "gemini" => ProviderConfig::Gemini {
                    api_key: String::new(),
                    base_url: None,
                },
                "anthropic" => ProviderConfig::Anthropic {
                    api_key: String::new(),
                    base_url: None,
                },
                _ => ProviderConfig::OpenAI {
                    api_key: String::new(),
                    base_url: None,
                    org_id: None,
                },
            });
        match entry {
            ProviderConfig::Gemini { api_key, .. }
            | ProviderConfig::Anthropic { api_key, .. }
            | ProviderConfig::OpenAI { api_key, .. } => *api_key = key,
            ProviderConfig::Ollama { .. } => {}
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizcoach.toml` in the current directory
/// 2. `~/.config/quizcoach/config.toml`
///
/// Environment variable overrides: `QUIZCOACH_GEMINI_KEY`,
/// `QUIZCOACH_ANTHROPIC_KEY`, `QUIZCOACH_OPENAI_KEY`.
pub fn load_config() -> Result<QuizcoachConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizcoachConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => [Some(PathBuf::from("quizcoach.toml")), config_dir().map(|d| d.join("config.toml"))]
            .into_iter()
            .flatten()
            .find(|candidate| candidate.exists()),
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizcoachConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizcoachConfig::default(),
    };
    tracing::debug!(path = ?config_path, "configuration loaded");

    apply_key_overrides(&mut config, |var| std::env::var(var).ok());

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

/// `~/.config/quizcoach`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizcoach"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            ensure_key("gemini", api_key)?;
            Arc::new(GeminiProvider::new(api_key, base_url.clone()))
        }
        ProviderConfig::Anthropic { api_key, base_url } => {
            ensure_key("anthropic", api_key)?;
            Arc::new(AnthropicProvider::new(api_key, base_url.clone()))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            ensure_key("openai", api_key)?;
            Arc::new(OpenAiProvider::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            ))
        }
        ProviderConfig::Ollama { base_url } => Arc::new(OllamaProvider::new(base_url)),
    };
    Ok(provider)
}

fn ensure_key(provider: &str, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!(
            "{provider} API key is empty. Set it in the config file or via {}",
            key_env_var(provider).unwrap_or("the environment")
        );
    }
    Ok(())
}
