//! Databricks Vector Search client.
//!
//! Talks to the REST query API of a Delta Sync / Direct Access index:
//! `POST {workspace}/api/2.0/vector-search/indexes/{index}/query`.
//! The index embeds `query_text` itself; this client never sees vectors.

use async_trait::async_trait;
use ragchain_core::config::VectorSearchConfig;
use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::index::{IndexSchema, SearchRequest, VectorIndex};
use ragchain_core::types::RetrievedChunk;
use serde_json::{Map, Value, json};
use std::time::Duration;

const DEFAULT_NUM_RESULTS: u64 = 5;

pub struct DatabricksVectorSearch {
    workspace_url: String,
    token: String,
    endpoint_name: String,
    index_name: String,
    schema: IndexSchema,
    client: reqwest::Client,
}

impl DatabricksVectorSearch {
    /// Resolution order:
    /// - workspace: `workspace_url` > `DATABRICKS_HOST`
    /// - token: `token` > `DATABRICKS_TOKEN`
    pub fn new(config: &VectorSearchConfig) -> Result<Self> {
        let workspace_url = if !config.workspace_url.is_empty() {
            config.workspace_url.clone()
        } else {
            std::env::var("DATABRICKS_HOST").unwrap_or_default()
        };
        let workspace_url = workspace_url.trim_end_matches('/').to_string();
        if workspace_url.is_empty() {
            return Err(RagError::Config(
                "vector_search.workspace_url (or DATABRICKS_HOST) is required".into(),
            ));
        }
        if config.index_name.is_empty() {
            return Err(RagError::Config("vector_search.index_name is required".into()));
        }

        let token = if !config.token.is_empty() {
            config.token.clone()
        } else {
            std::env::var("DATABRICKS_TOKEN").unwrap_or_default()
        };

        let mut builder = reqwest::Client::builder().user_agent("ragchain/0.1");
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            workspace_url,
            token,
            endpoint_name: config.endpoint_name.clone(),
            index_name: config.index_name.clone(),
            schema: config.schema.clone(),
            client,
        })
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.token))
        }
    }
}

/// Build the query body. `k` becomes `num_results`; every other parameter is
/// copied verbatim. The equality filter goes out as `filters_json`.
pub(crate) fn build_query_body(request: &SearchRequest, schema: &IndexSchema) -> Value {
    let mut body: Map<String, Value> = Map::new();
    let mut num_results = DEFAULT_NUM_RESULTS;

    for (key, value) in &request.parameters {
        match key.as_str() {
            "k" | "num_results" => {
                if let Some(k) = value.as_u64() {
                    num_results = k;
                }
            }
            // The chain owns the filter.
            "filter" | "filters" | "filters_json" => {}
            _ => {
                body.insert(key.clone(), value.clone());
            }
        }
    }

    body.insert("query_text".into(), json!(request.query));
    body.insert("columns".into(), json!(schema.columns()));
    body.insert("num_results".into(), json!(num_results));
    if !request.filter.is_empty() {
        let filter: Map<String, Value> = request
            .filter
            .iter()
            .map(|(k, v)| (k.clone(), json!(v.trim())))
            .collect();
        body.insert(
            "filters_json".into(),
            json!(Value::Object(filter).to_string()),
        );
    }
    Value::Object(body)
}

fn cell_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Map `manifest.columns` + `result.data_array` onto chunks, keeping row order.
pub(crate) fn parse_query_response(
    json: &Value,
    schema: &IndexSchema,
) -> Result<Vec<RetrievedChunk>> {
    let columns: Vec<&str> = json["manifest"]["columns"]
        .as_array()
        .ok_or_else(|| RagError::VectorSearch("response has no manifest.columns".into()))?
        .iter()
        .map(|c| c["name"].as_str().unwrap_or(""))
        .collect();

    let position = |name: &str| columns.iter().position(|c| *c == name);
    let text_idx = position(&schema.chunk_text).ok_or_else(|| {
        RagError::VectorSearch(format!(
            "response is missing the '{}' column",
            schema.chunk_text
        ))
    })?;
    let pk_idx = position(&schema.primary_key);
    let uri_idx = position(&schema.document_uri);
    let topic_idx = position(&schema.topic);
    let title_idx = position(&schema.title);
    let score_idx = position("score");

    let Some(rows) = json["result"]["data_array"].as_array() else {
        // Zero hits come back without a data_array.
        return Ok(Vec::new());
    };

    rows.iter()
        .map(|row| {
            let row = row
                .as_array()
                .ok_or_else(|| RagError::VectorSearch("data_array row is not an array".into()))?;
            let cell = |idx: Option<usize>| cell_to_string(idx.and_then(|i| row.get(i)));
            Ok(RetrievedChunk {
                primary_key: cell(pk_idx),
                text: cell(Some(text_idx)),
                source_uri: cell(uri_idx),
                topic: cell(topic_idx),
                title: cell(title_idx),
                score: score_idx.and_then(|i| row.get(i)).and_then(|v| v.as_f64()),
            })
        })
        .collect()
}

#[async_trait]
impl VectorIndex for DatabricksVectorSearch {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedChunk>> {
        let url = format!(
            "{}/api/2.0/vector-search/indexes/{}/query",
            self.workspace_url,
            urlencoding::encode(&self.index_name)
        );
        let body = build_query_body(request, &self.schema);
        let req = self.apply_auth(self.client.post(&url).json(&body));

        let resp = req
            .send()
            .await
            .map_err(|e| RagError::Http(format!("vector search connection failed ({url}): {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RagError::VectorSearch(format!(
                "{} query error {}: {}",
                self.index_name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| RagError::VectorSearch(format!("malformed query response: {e}")))?;
        parse_query_response(&json, &self.schema)
    }

    async fn health_check(&self) -> Result<bool> {
        if self.endpoint_name.is_empty() {
            return Ok(!self.token.is_empty());
        }
        let url = format!(
            "{}/api/2.0/vector-search/endpoints/{}",
            self.workspace_url,
            urlencoding::encode(&self.endpoint_name)
        );
        match self.apply_auth(self.client.get(&url)).send().await {
            Ok(r) if r.status().is_success() => {
                let Ok(json) = r.json::<Value>().await else {
                    return Ok(false);
                };
                Ok(json["endpoint_status"]["state"].as_str() == Some("ONLINE"))
            }
            _ => Ok(false),
        }
    }
}
