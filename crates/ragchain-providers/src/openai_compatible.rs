//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions for every backend in the
//! registry (Databricks model serving, OpenAI, Ollama, vLLM, ...). Backends
//! differ only by endpoint URL, auth style and API key.
//!
//! No retries: a failed call is reported once and propagated.

use async_trait::async_trait;
use ragchain_core::config::LlmConfig;
use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::types::{Message, ProviderResponse, Usage};
use serde_json::{Value, json};
use std::time::Duration;

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "databricks", "openai").
    name: String,
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    /// Path for chat completions (e.g., "/chat/completions").
    chat_path: String,
    /// Path probed by health checks on keyless servers.
    models_path: String,
    /// Authentication style.
    auth_style: AuthStyle,
    /// HTTP client.
    client: reqwest::Client,
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent("ragchain/0.1");
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder
        .build()
        .map_err(|e| RagError::Http(format!("failed to build HTTP client: {e}")))
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + `[llm]` config.
    ///
    /// Resolution order:
    /// - API key: `config.api_key` > env vars > empty
    /// - Base URL: `config.endpoint` > env override > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &LlmConfig) -> Result<Self> {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
                .unwrap_or_default()
        };

        let base_url = if !config.endpoint.is_empty() {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = std::env::var(env_key).ok().filter(|v| !v.is_empty())?;
                    let val = val.trim_end_matches('/');
                    // DATABRICKS_HOST / OLLAMA_HOST name the server, not the API root
                    if val.ends_with(registry.env_url_suffix) {
                        Some(val.to_string())
                    } else {
                        Some(format!("{val}{}", registry.env_url_suffix))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        if base_url.is_empty() {
            return Err(RagError::Config(format!(
                "{} needs a base URL: set llm.endpoint or {}",
                registry.name,
                registry.base_url_env.unwrap_or("an endpoint override")
            )));
        }

        Ok(Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            models_path: registry.models_path.to_string(),
            auth_style: registry.auth_style,
            client: build_client(config.request_timeout_secs)?,
        })
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &LlmConfig) -> Result<Self> {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Ok(Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            models_path: "/models".to_string(),
            auth_style,
            client: build_client(config.request_timeout_secs)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }
}

/// Request body: the opaque parameters first, then `model` and `messages`,
/// which parameters cannot override.
pub(crate) fn build_body(messages: &[Message], params: &GenerateParams) -> Result<Value> {
    let mut body = params.parameters.clone();
    body.insert("model".into(), json!(params.model));
    body.insert("messages".into(), serde_json::to_value(messages)?);
    Ok(Value::Object(body))
}

/// Parse a standard OpenAI chat-completions response.
pub(crate) fn parse_response(json: &Value) -> Result<ProviderResponse> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| RagError::Provider("No choices in response".into()))?;

    let content = choice["message"]["content"].as_str().map(String::from);

    let usage = json["usage"].as_object().map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        completion_tokens: u
            .get("completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
        total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    });

    Ok(ProviderResponse {
        content,
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage,
    })
}

#[async_trait]
impl ChatModel for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        // For providers that require auth, check API key
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(RagError::ApiKeyMissing(self.name.clone()));
        }

        let body = build_body(messages, params)?;

        let url = format!("{}{}", self.base_url, self.chat_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        tracing::debug!(
            "→ {} chat ({} messages, model={})",
            self.name,
            messages.len(),
            params.model
        );

        let resp = req.send().await.map_err(|e| {
            RagError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RagError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp.json().await.map_err(|e| {
            RagError::Provider(format!("{} returned malformed JSON: {e}", self.name))
        })?;

        let response = parse_response(&json)?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                "← {} tokens: {} prompt / {} completion",
                self.name,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }
        Ok(response)
    }

    async fn health_check(&self) -> Result<bool> {
        if self.auth_style != AuthStyle::None {
            // For cloud providers, just check if API key is set
            return Ok(!self.api_key.is_empty());
        }

        // For local servers (ollama, vllm), try to connect
        let url = format!("{}{}", self.base_url, self.models_path);
        let resp = self.client.get(&url).send().await;
        Ok(resp.is_ok())
    }
}
