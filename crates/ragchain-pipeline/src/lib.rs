//! # ragchain pipeline
//!
//! Conversational retrieval-augmented generation over a topic-partitioned
//! vector index.
//!
//! ## Flow
//! ```text
//! [turns...] ─ normalizer ─► question + history
//!                              │
//!             history empty? ──┴─► Passthrough(question)
//!             otherwise ─────────► Rewritten(model(rewrite prompt))
//!                              │
//!                  classifier ─► topic label (closed set, fail closed)
//!                              │
//!                   retriever ─► index.search(query, topic = label) → context block
//!                              │
//!                   generator ─► model(system + history + original question)
//! ```
//!
//! No stage retries or swallows errors; the first failure ends the request.
//! History is passed through uncompressed, so very long conversations can
//! exceed the model's context window.

mod call;
pub mod chain;
pub mod classifier;
pub mod generator;
pub mod normalizer;
pub mod retriever;
pub mod rewriter;

pub use chain::{AnswerTrace, RagChain};
pub use generator::PromptContext;
pub use rewriter::RewriteDecision;
