//! # ragchain providers
//!
//! Language-model collaborators for the chain.
//!
//! Every supported backend (Databricks model serving, OpenAI, OpenRouter,
//! Groq, DeepSeek, Together, Ollama, vLLM) is OpenAI-compatible and handled by
//! a single `OpenAiCompatibleProvider`.

pub mod openai_compatible;
pub mod provider_registry;

use ragchain_core::config::LlmConfig;
use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::ChatModel;
use std::sync::Arc;

/// Create the language-model collaborator from `[llm]` configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    let provider_name = config.provider.as_str();

    match provider_name {
        // Custom endpoint: "custom:https://my-server.com/v1"
        other if other.starts_with("custom:") => Ok(Arc::new(
            openai_compatible::OpenAiCompatibleProvider::custom(other, config)?,
        )),

        _ => {
            let registry = provider_registry::get_provider_config(provider_name)
                .ok_or_else(|| RagError::ProviderNotFound(provider_name.into()))?;
            Ok(Arc::new(
                openai_compatible::OpenAiCompatibleProvider::from_registry(registry, config)?,
            ))
        }
    }
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "nope".into(),
            ..LlmConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, RagError::ProviderNotFound(_)));
    }

    #[test]
    fn test_custom_provider() {
        let config = LlmConfig {
            provider: "custom:http://localhost:1234/v1/".into(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "custom");
    }

    #[test]
    fn test_available_providers() {
        let names = available_providers();
        assert!(names.contains(&"databricks"));
        assert!(names.contains(&"custom"));
    }
}
