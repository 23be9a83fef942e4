//! Closed topic label set and classifier-output matching.
//!
//! Matching rule: trim surrounding whitespace, case-fold, then require an
//! exact match against one configured label. Nothing fuzzier.

use serde::Serialize;
use std::fmt;

use crate::error::{RagError, Result};

/// A label guaranteed to belong to the configured set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TopicLabel(String);

impl TopicLabel {
    /// The label exactly as configured; this is the filter value sent to the index.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The configured, non-empty set of topic labels.
#[derive(Debug, Clone)]
pub struct TopicSet {
    labels: Vec<String>,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl TopicSet {
    /// Build from configured labels. Labels are trimmed; empty or duplicate
    /// (after normalization) labels are configuration errors.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(RagError::Config("topic labels must not be empty".into()));
            }
            if out.iter().any(|l| normalize(l) == normalize(label)) {
                return Err(RagError::Config(format!("duplicate topic label '{label}'")));
            }
            out.push(label.to_string());
        }
        if out.is_empty() {
            return Err(RagError::Config("at least one topic label is required".into()));
        }
        Ok(Self { labels: out })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Labels joined with `,` for the classification prompt.
    pub fn joined(&self) -> String {
        self.labels.join(",")
    }

    /// Map raw model output onto a configured label, or fail with
    /// `ClassificationAmbiguity`.
    pub fn resolve(&self, raw: &str) -> Result<TopicLabel> {
        let wanted = normalize(raw);
        self.labels
            .iter()
            .find(|l| normalize(l) == wanted)
            .map(|l| TopicLabel(l.clone()))
            .ok_or_else(|| RagError::ClassificationAmbiguity {
                output: raw.trim().to_string(),
                labels: self.labels.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biomed() -> TopicSet {
        TopicSet::new(["cancer vaccines", "stem cell therapy", "cellular reprogramming"]).unwrap()
    }

    #[test]
    fn test_resolve_exact_and_variants() {
        let topics = biomed();
        assert_eq!(topics.resolve("cancer vaccines").unwrap().as_str(), "cancer vaccines");
        assert_eq!(topics.resolve("  Cancer Vaccines\n").unwrap().as_str(), "cancer vaccines");
        assert_eq!(topics.resolve("STEM CELL THERAPY").unwrap().as_str(), "stem cell therapy");
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let err = biomed().resolve("I'm not sure").unwrap_err();
        match err {
            RagError::ClassificationAmbiguity { output, labels } => {
                assert_eq!(output, "I'm not sure");
                assert_eq!(labels.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Punctuation is not stripped.
        assert!(biomed().resolve("cancer vaccines.").is_err());
    }

    #[test]
    fn test_invalid_sets() {
        assert!(TopicSet::new(Vec::<String>::new()).is_err());
        assert!(TopicSet::new(["a", " "]).is_err());
        assert!(TopicSet::new(["Alpha", "alpha "]).is_err());
    }

    #[test]
    fn test_joined() {
        assert_eq!(
            biomed().joined(),
            "cancer vaccines,stem cell therapy,cellular reprogramming"
        );
    }
}
