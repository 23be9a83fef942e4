//! Vector-index collaborator.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::RetrievedChunk;

/// Column names of the index, mapped onto `RetrievedChunk` fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexSchema {
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_chunk_text")]
    pub chunk_text: String,
    #[serde(default = "default_document_uri")]
    pub document_uri: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_primary_key() -> String { "chunk_id".into() }
fn default_chunk_text() -> String { "chunked_text".into() }
fn default_document_uri() -> String { "url".into() }
fn default_topic() -> String { "topic".into() }
fn default_title() -> String { "title".into() }

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            chunk_text: default_chunk_text(),
            document_uri: default_document_uri(),
            topic: default_topic(),
            title: default_title(),
        }
    }
}

impl IndexSchema {
    /// Columns requested from the index, in a fixed order.
    pub fn columns(&self) -> Vec<String> {
        vec![
            self.primary_key.clone(),
            self.chunk_text.clone(),
            self.document_uri.clone(),
            self.topic.clone(),
            self.title.clone(),
        ]
    }
}

/// One nearest-neighbour lookup.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Natural-language query; embedding is the index's job.
    pub query: String,
    /// Equality filters, column -> value.
    pub filter: BTreeMap<String, String>,
    /// Opaque search parameters (k, query_type, score_threshold, ...).
    pub parameters: Map<String, Value>,
}

/// A similarity index that returns chunks in ranked order.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedChunk>>;

    async fn health_check(&self) -> Result<bool>;
}
