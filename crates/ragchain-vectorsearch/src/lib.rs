//! # ragchain vector search
//!
//! Vector-index collaborators: nearest-neighbour lookup with an equality
//! filter, returning chunks in ranked order.
//!
//! ## Backends
//! - **databricks** — Databricks Vector Search REST query API; the index
//!   embeds the query text server-side
//! - **memory** — chunks from a JSON file in an in-memory SQLite FTS5 table,
//!   BM25 ranking, for local runs without a workspace
//!
//! ```text
//! rephrased question + topic
//!   ↓
//! index.search(query, {topic: label}, {k, query_type, ...})
//!   ↓
//! ranked chunks → chunk template → context block
//! ```

pub mod databricks;
pub mod memory;

pub use databricks::DatabricksVectorSearch;
pub use memory::InMemoryIndex;

use ragchain_core::config::VectorSearchConfig;
use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::VectorIndex;
use std::path::Path;
use std::sync::Arc;

/// Create the vector-index collaborator from `[vector_search]` configuration.
pub fn create_index(config: &VectorSearchConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.backend.as_str() {
        "databricks" => Ok(Arc::new(DatabricksVectorSearch::new(config)?)),
        "memory" => {
            if config.data_path.is_empty() {
                return Err(RagError::Config(
                    "vector_search.data_path is required for the memory backend".into(),
                ));
            }
            Ok(Arc::new(InMemoryIndex::from_file(
                Path::new(&config.data_path),
                config.schema.clone(),
            )?))
        }
        other => Err(RagError::Config(format!(
            "unknown vector_search.backend '{other}' (expected 'databricks' or 'memory')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend() {
        let config = VectorSearchConfig {
            backend: "faiss".into(),
            ..VectorSearchConfig::default()
        };
        assert!(matches!(create_index(&config).err(), Some(RagError::Config(_))));
    }

    #[test]
    fn test_memory_backend_needs_path() {
        let config = VectorSearchConfig {
            backend: "memory".into(),
            ..VectorSearchConfig::default()
        };
        assert!(create_index(&config).is_err());
    }
}
