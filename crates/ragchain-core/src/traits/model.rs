//! Language-model collaborator.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::{Message, ProviderResponse};

/// Generation settings for one call.
///
/// `parameters` is opaque to the chain (temperature, max_tokens, ...) and is
/// merged verbatim into the provider request.
#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    /// Model or serving-endpoint identifier.
    pub model: String,
    pub parameters: Map<String, Value>,
}

/// A chat-completions capable model. Shared across concurrent requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Complete a message sequence. A single rendered prompt is sent as one
    /// user message.
    async fn chat(&self, messages: &[Message], params: &GenerateParams)
    -> Result<ProviderResponse>;

    /// Cheap reachability / credential check.
    async fn health_check(&self) -> Result<bool>;
}
