//! The `quizcoach list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use quizcoach_core::traits::ModelInfo;
use quizcoach_providers::config::load_config_from;
use quizcoach_providers::ollama::OllamaProvider;
use quizcoach_providers::{create_provider, ProviderConfig};

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();

    let mut found_any = false;

    for name in names {
        if provider_filter.as_ref().is_some_and(|filter| filter != name) {
            continue;
        }
        let provider_config = &config.providers[name];

        let models = match provider_config {
            // Installed models are only known to the running daemon
            ProviderConfig::Ollama { base_url } => {
                match OllamaProvider::new(base_url).list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        println!("Provider: {name}\n  unavailable: {e}\n");
                        continue;
                    }
                }
            }
            other => create_provider(other)?.available_models(),
        };

        if !models.is_empty() {
            found_any = true;
            print_models(name, &models, name == &config.default_provider);
        }
    }

    if !found_any {
        println!("No providers configured. Run `quizcoach init` to create a config file.");
    }

    Ok(())
}

fn print_models(provider: &str, models: &[ModelInfo], is_default: bool) {
    let marker = if is_default { " (default)" } else { "" };
    println!("Provider: {provider}{marker}");
    for model in models {
        if model.max_context > 0 {
            println!(
                "  {} - {} ({}K context)",
                model.id,
                model.name,
                model.max_context / 1000
            );
        } else {
            println!("  {}", model.id);
        }
    }
    println!();
}
