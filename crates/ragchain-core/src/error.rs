//! Error types for ragchain.

use thiserror::Error;

/// Result alias used across every ragchain crate.
pub type Result<T> = std::result::Result<T, RagError>;

/// All failures a chain invocation (or its setup) can surface.
#[derive(Debug, Error)]
pub enum RagError {
    /// Empty conversation, unknown role, or a last turn not authored by the user.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The topic classifier answered with something outside the configured label set.
    #[error("Topic classification ambiguous: model answered {output:?}, expected one of {labels:?}")]
    ClassificationAmbiguity { output: String, labels: Vec<String> },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Vector search error: {0}")]
    VectorSearch(String),

    #[error("{stage} call timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    /// The language model or vector index failed (network, auth, quota, malformed response).
    Collaborator,
    ClassificationAmbiguity,
    /// Setup problems: bad config, bad templates, unreadable files.
    Config,
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::InvalidInput(_) => ErrorKind::InvalidInput,
            RagError::ClassificationAmbiguity { .. } => ErrorKind::ClassificationAmbiguity,
            RagError::Provider(_)
            | RagError::ProviderNotFound(_)
            | RagError::ApiKeyMissing(_)
            | RagError::Http(_)
            | RagError::VectorSearch(_)
            | RagError::Timeout { .. } => ErrorKind::Collaborator,
            RagError::Config(_) | RagError::Template(_) | RagError::Io(_) | RagError::Json(_) => {
                ErrorKind::Config
            }
        }
    }

    pub fn is_collaborator(&self) -> bool {
        self.kind() == ErrorKind::Collaborator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            RagError::InvalidInput("empty".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            RagError::Timeout { stage: "retrieve", secs: 3 }.kind(),
            ErrorKind::Collaborator
        );
        assert!(RagError::Http("refused".into()).is_collaborator());
        assert!(RagError::VectorSearch("403".into()).is_collaborator());
        assert!(!RagError::Template("bad".into()).is_collaborator());
    }

    #[test]
    fn test_ambiguity_message() {
        let err = RagError::ClassificationAmbiguity {
            output: "I'm not sure".into(),
            labels: vec!["cancer vaccines".into()],
        };
        assert_eq!(err.kind(), ErrorKind::ClassificationAmbiguity);
        assert!(err.to_string().contains("I'm not sure"));
    }
}
