//! Collaborator traits. The chain only ever talks to these.

pub mod index;
pub mod model;

pub use index::{IndexSchema, SearchRequest, VectorIndex};
pub use model::{ChatModel, GenerateParams};
