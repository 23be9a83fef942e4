//! # ragchain core
//!
//! Shared vocabulary for the conversational RAG chain: chat turns, retrieved
//! chunks, topic labels, the error taxonomy, configuration, prompt templates
//! and the two collaborator traits (`ChatModel`, `VectorIndex`).

pub mod config;
pub mod error;
pub mod prompt;
pub mod topic;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{ErrorKind, RagError, Result};
pub use topic::{TopicLabel, TopicSet};
pub use traits::{ChatModel, VectorIndex};
