//! Topic-filtered retrieval and context formatting.

use ragchain_core::error::Result;
use ragchain_core::prompt::PromptTemplate;
use ragchain_core::topic::TopicLabel;
use ragchain_core::traits::index::{IndexSchema, SearchRequest, VectorIndex};
use ragchain_core::types::RetrievedChunk;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::call;

pub const CHUNK_VARS: &[&str] = &["chunk_text", "document_uri", "title", "source_uri"];

pub struct ContextRetriever {
    index: Arc<dyn VectorIndex>,
    schema: IndexSchema,
    parameters: Map<String, Value>,
    chunk_template: PromptTemplate,
    timeout: Option<Duration>,
}

impl ContextRetriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        schema: IndexSchema,
        parameters: Map<String, Value>,
        chunk_template: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            index,
            schema,
            parameters,
            chunk_template: PromptTemplate::parse("chunk_template", chunk_template, CHUNK_VARS)?,
            timeout,
        })
    }

    /// Nearest-neighbour search restricted to `topic`, in the index's rank order.
    pub async fn retrieve(&self, query: &str, topic: &TopicLabel) -> Result<Vec<RetrievedChunk>> {
        let request = SearchRequest {
            query: query.to_string(),
            filter: BTreeMap::from([(
                self.schema.topic.clone(),
                topic.as_str().trim().to_string(),
            )]),
            parameters: self.parameters.clone(),
        };
        let chunks = call::bounded("retrieve", self.timeout, self.index.search(&request)).await?;
        tracing::debug!(
            "🔎 {} chunk(s) from {} for topic '{topic}'",
            chunks.len(),
            self.index.name()
        );
        Ok(chunks)
    }

    /// Render every chunk through the chunk template and concatenate in
    /// order. No chunks gives an empty string.
    pub fn format_context(&self, chunks: &[RetrievedChunk]) -> Result<String> {
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&self.chunk_template.render(&[
                ("chunk_text", chunk.text.as_str()),
                // The document label shown to the model is the title.
                ("document_uri", chunk.title.as_str()),
                ("title", chunk.title.as_str()),
                ("source_uri", chunk.source_uri.as_str()),
            ])?);
        }
        Ok(out)
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.index.health_check().await
    }
}
