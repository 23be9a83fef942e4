//! ragchain configuration system.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RagError, Result};
use crate::traits::index::IndexSchema;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub vector_search: VectorSearchConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl RagConfig {
    /// Load config from the default path (~/.ragchain/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {e}")))
    }

    /// Save config to a path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the ragchain home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragchain")
    }
}

/// Language-model collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Registry name ("databricks", "openai", "ollama", ...) or "custom:<base url>".
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    /// Serving endpoint / model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Base URL override.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Opaque generation parameters merged into every request.
    #[serde(default = "default_llm_parameters")]
    pub parameters: Map<String, Value>,
}

fn default_llm_provider() -> String { "databricks".into() }
fn default_llm_model() -> String { "databricks-meta-llama-3-1-70b-instruct".into() }
fn default_request_timeout() -> u64 { 60 }

fn default_llm_parameters() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("temperature".into(), json!(0.01));
    params.insert("max_tokens".into(), json!(1500));
    params
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            endpoint: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
            parameters: default_llm_parameters(),
        }
    }
}

/// Vector-index collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchConfig {
    /// "databricks" or "memory".
    #[serde(default = "default_vs_backend")]
    pub backend: String,
    #[serde(default)]
    pub endpoint_name: String,
    #[serde(default)]
    pub index_name: String,
    /// Workspace base URL; falls back to `DATABRICKS_HOST`.
    #[serde(default)]
    pub workspace_url: String,
    /// Access token; falls back to `DATABRICKS_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// JSON chunk file for the memory backend.
    #[serde(default)]
    pub data_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub schema: IndexSchema,
    /// Opaque search parameters (k, query_type, score_threshold, ...).
    #[serde(default = "default_vs_parameters")]
    pub parameters: Map<String, Value>,
}

fn default_vs_backend() -> String { "databricks".into() }

fn default_vs_parameters() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("k".into(), json!(5));
    params.insert("query_type".into(), json!("ann"));
    params
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            backend: default_vs_backend(),
            endpoint_name: String::new(),
            index_name: String::new(),
            workspace_url: String::new(),
            token: String::new(),
            data_path: String::new(),
            request_timeout_secs: default_request_timeout(),
            schema: IndexSchema::default(),
            parameters: default_vs_parameters(),
        }
    }
}

/// Prompt templates and the closed topic set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Placeholders: {chunk_text}, {document_uri}, {title}, {source_uri}.
    #[serde(default = "default_chunk_template")]
    pub chunk_template: String,
    /// Placeholders: {context}, {question}.
    #[serde(default = "default_system_prompt_template")]
    pub system_prompt_template: String,
    /// Placeholders: {chat_history}, {question}.
    #[serde(default = "default_query_rewrite_template")]
    pub query_rewrite_template: String,
    /// Placeholders: {topics}, {question}.
    #[serde(default = "default_topic_template")]
    pub topic_template: String,
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

fn default_chunk_template() -> String {
    "Passage: {chunk_text}\nDocument: {document_uri}\n\n".into()
}

fn default_system_prompt_template() -> String {
    "You are an assistant that answers questions about biomedical research. \
     Use the following pieces of retrieved context to answer the question. \
     Some pieces of context may be irrelevant, in which case you should not use them to form the answer.\n\n\
     Context: {context}"
        .into()
}

fn default_query_rewrite_template() -> String {
    "Based on the chat history below, we want you to generate a query for an external data source \
     to retrieve relevant documents so that we can better answer the question. \
     The query should be in natural language. The external data source uses similarity search \
     to search for relevant documents in a vector space. So the query should be similar to the \
     relevant documents semantically. Answer with only the query. Do not add explanation.\n\n\
     Chat history: {chat_history}\n\n\
     Question: {question}"
        .into()
}

fn default_topic_template() -> String {
    "Based on the question provided by the user, classify the topic into exactly one of the \
     categories below (comma delimited). Only provide the category and no other text.\n\
     --- list of topics\n\
     {topics}\n\
     --- end list of topics\n\
     Question: {question}"
        .into()
}

fn default_topics() -> Vec<String> {
    vec!["cancer vaccines", "stem cell therapy", "cellular reprogramming"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            chunk_template: default_chunk_template(),
            system_prompt_template: default_system_prompt_template(),
            query_rewrite_template: default_query_rewrite_template(),
            topic_template: default_topic_template(),
            topics: default_topics(),
        }
    }
}

/// Chain-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on each collaborator call; 0 disables.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout() -> u64 { 120 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RagConfig::default();
        assert_eq!(config.llm.provider, "databricks");
        assert_eq!(config.vector_search.schema.topic, "topic");
        assert_eq!(config.prompts.topics.len(), 3);
        assert_eq!(config.vector_search.parameters["k"], 5);
        assert_eq!(
            config.pipeline.call_timeout(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [llm]
            provider = "ollama"
            model = "llama3.2"

            [llm.parameters]
            temperature = 0.0
            max_tokens = 256

            [vector_search]
            backend = "memory"
            data_path = "chunks.json"

            [vector_search.schema]
            chunk_text = "content"

            [vector_search.parameters]
            k = 3
            query_type = "hybrid"
            score_threshold = 0.5

            [prompts]
            topics = ["billing", "shipping"]

            [pipeline]
            call_timeout_secs = 0
        "#;

        let config = RagConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.parameters["max_tokens"], 256);
        assert_eq!(config.vector_search.backend, "memory");
        assert_eq!(config.vector_search.schema.chunk_text, "content");
        assert_eq!(config.vector_search.schema.primary_key, "chunk_id");
        assert_eq!(config.vector_search.parameters["query_type"], "hybrid");
        assert_eq!(config.prompts.topics, vec!["billing", "shipping"]);
        assert!(config.prompts.chunk_template.contains("{chunk_text}"));
        assert_eq!(config.pipeline.call_timeout(), None);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config = RagConfig::from_toml("").unwrap();
        assert_eq!(config.llm.request_timeout_secs, 60);
        assert_eq!(config.vector_search.backend, "databricks");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = RagConfig::from_toml("[llm\nprovider = 1").unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = RagConfig::default();
        config.llm.model = "my-endpoint".into();
        config.save_to(&path).unwrap();

        let loaded = RagConfig::load_from(&path).unwrap();
        assert_eq!(loaded.llm.model, "my-endpoint");
        assert_eq!(loaded.prompts.topics, config.prompts.topics);
    }

    #[test]
    fn test_home_dir() {
        let home = RagConfig::home_dir();
        assert!(home.to_string_lossy().contains("ragchain"));
    }
}
