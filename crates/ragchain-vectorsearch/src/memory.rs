//! In-memory chunk index for local runs and tests.
//!
//! No embeddings: chunks live in an in-memory SQLite FTS5 table and rank by
//! BM25 over text and title. The reported score is the negated BM25 value,
//! so higher is better. Equal scores keep insertion order.

use async_trait::async_trait;
use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::index::{IndexSchema, SearchRequest, VectorIndex};
use ragchain_core::types::RetrievedChunk;
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::sync::Mutex;

const DEFAULT_K: usize = 5;

const CREATE_TABLE: &str = "CREATE VIRTUAL TABLE chunks USING fts5(
    text, title,
    primary_key UNINDEXED, source_uri UNINDEXED, topic UNINDEXED,
    tokenize = 'porter unicode61'
)";

pub struct InMemoryIndex {
    name: String,
    schema: IndexSchema,
    conn: Mutex<Connection>,
    len: usize,
}

fn sql_err(e: rusqlite::Error) -> RagError {
    RagError::VectorSearch(format!("fts index: {e}"))
}

/// FTS5 match expression: each term quoted, any term may match.
fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" OR "))
}

impl InMemoryIndex {
    pub fn new(schema: IndexSchema, chunks: Vec<RetrievedChunk>) -> Result<Self> {
        Self::build("memory".into(), schema, chunks)
    }

    /// Load a JSON array of chunks
    /// (`{"primary_key", "text", "source_uri", "topic", "title"}`).
    pub fn from_file(path: &Path, schema: IndexSchema) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("Failed to read chunk file {}: {e}", path.display()))
        })?;
        let chunks: Vec<RetrievedChunk> = serde_json::from_str(&content)?;
        tracing::info!("📚 Loaded {} chunks from {}", chunks.len(), path.display());
        Self::build(path.display().to_string(), schema, chunks)
    }

    fn build(name: String, schema: IndexSchema, chunks: Vec<RetrievedChunk>) -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(sql_err)?;
        conn.execute(CREATE_TABLE, []).map_err(sql_err)?;

        let tx = conn.transaction().map_err(sql_err)?;
        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO chunks (text, title, primary_key, source_uri, topic)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(sql_err)?;
            for c in &chunks {
                insert
                    .execute(params![c.text, c.title, c.primary_key, c.source_uri, c.topic])
                    .map_err(sql_err)?;
            }
        }
        tx.commit().map_err(sql_err)?;

        Ok(Self {
            name,
            schema,
            conn: Mutex::new(conn),
            len: chunks.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// FTS column backing the schema column `column`, if the column is known.
    fn fts_column(&self, column: &str) -> Option<&'static str> {
        let s = &self.schema;
        if column == s.topic {
            Some("topic")
        } else if column == s.title {
            Some("title")
        } else if column == s.document_uri {
            Some("source_uri")
        } else if column == s.primary_key {
            Some("primary_key")
        } else if column == s.chunk_text {
            Some("text")
        } else {
            None
        }
    }

    fn query(&self, request: &SearchRequest) -> Result<Vec<RetrievedChunk>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        let matcher = match_expression(&request.query);
        if let Some(expr) = &matcher {
            clauses.push("chunks MATCH ?".to_string());
            values.push(expr.clone());
        }
        for (column, value) in &request.filter {
            let fts = self.fts_column(column).ok_or_else(|| {
                RagError::VectorSearch(format!("unknown filter column '{column}'"))
            })?;
            clauses.push(format!("{fts} = ?"));
            values.push(value.trim().to_string());
        }

        let (score, order) = if matcher.is_some() {
            ("-bm25(chunks)", "bm25(chunks), rowid")
        } else {
            ("0.0", "rowid")
        };
        let mut sql = format!(
            "SELECT primary_key, text, source_uri, topic, title, {score} FROM chunks"
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(order);

        let conn = self
            .conn
            .lock()
            .map_err(|_| RagError::VectorSearch("fts index lock poisoned".into()))?;
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(RetrievedChunk {
                    primary_key: row.get(0)?,
                    text: row.get(1)?,
                    source_uri: row.get(2)?,
                    topic: row.get(3)?,
                    title: row.get(4)?,
                    score: Some(row.get(5)?),
                })
            })
            .map_err(sql_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(sql_err)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedChunk>> {
        let k = request
            .parameters
            .get("k")
            .or_else(|| request.parameters.get("num_results"))
            .and_then(|v| v.as_u64())
            .map(|k| k as usize)
            .unwrap_or(DEFAULT_K);
        let threshold = request
            .parameters
            .get("score_threshold")
            .and_then(|v| v.as_f64());

        Ok(self
            .query(request)?
            .into_iter()
            .filter(|c| threshold.is_none_or(|t| c.score.unwrap_or(0.0) >= t))
            .take(k)
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn chunk(id: &str, topic: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            primary_key: id.into(),
            text: text.into(),
            source_uri: format!("docs/{id}.pdf"),
            topic: topic.into(),
            title: format!("Doc {id}"),
            score: None,
        }
    }

    fn index() -> InMemoryIndex {
        InMemoryIndex::new(
            IndexSchema::default(),
            vec![
                chunk("1", "cancer vaccines", "HPV vaccines and age"),
                chunk("2", "stem cell therapy", "mesenchymal stem cells treat lupus"),
                chunk("3", "stem cell therapy", "stem cells side effects are rare"),
                chunk("4", "stem cell therapy", "unrelated passage"),
            ],
        )
        .unwrap()
    }

    fn request(query: &str, topic: &str, k: u64) -> SearchRequest {
        let mut parameters = serde_json::Map::new();
        parameters.insert("k".into(), json!(k));
        SearchRequest {
            query: query.into(),
            filter: BTreeMap::from([("topic".to_string(), topic.to_string())]),
            parameters,
        }
    }

    #[tokio::test]
    async fn test_filter_and_rank() {
        let hits = index()
            .search(&request("stem cells side effects", "stem cell therapy", 2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].primary_key, "3");
        assert_eq!(hits[1].primary_key, "2");
        assert!(hits.iter().all(|h| h.topic == "stem cell therapy"));
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let hits = index()
            .search(&request("anything", "cellular reprogramming", 5))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_chunks_dropped() {
        let hits = index()
            .search(&request("stem cells side effects", "stem cell therapy", 5))
            .await
            .unwrap();
        // Chunk 4 shares no term with the query.
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_score_threshold() {
        let mut req = request("stem cells side effects", "stem cell therapy", 5);
        req.parameters.insert("score_threshold".into(), json!(1.0e9));
        assert!(index().search(&req).await.unwrap().is_empty());

        req.parameters.insert("score_threshold".into(), json!(0.0));
        assert_eq!(index().search(&req).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_syntax_is_not_interpreted() {
        let hits = index()
            .search(&request("\"lupus\" OR NEAR(stem*) -- ;", "stem cell therapy", 5))
            .await
            .unwrap();
        assert_eq!(hits[0].primary_key, "2");
    }

    #[tokio::test]
    async fn test_empty_query_keeps_insertion_order() {
        let hits = index().search(&request("?", "stem cell therapy", 5)).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.primary_key.as_str()).collect();
        assert_eq!(ids, ["2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_unknown_filter_column() {
        let mut req = request("x", "y", 1);
        req.filter = BTreeMap::from([("category".to_string(), "y".to_string())]);
        assert!(index().search(&req).await.is_err());
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.json");
        std::fs::write(
            &path,
            r#"[{"primary_key": "a", "text": "t", "source_uri": "u", "topic": "x", "title": "T"}]"#,
        )
        .unwrap();
        let index = InMemoryIndex::from_file(&path, IndexSchema::default()).unwrap();
        assert_eq!(index.len(), 1);
    }
}
