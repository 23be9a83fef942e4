//! Prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` render as literal braces. Templates are parsed once, up
//! front, against the placeholder names their stage supplies, so a typo in
//! configuration fails at startup rather than mid-request.

use crate::error::{RagError, Result};
use regex::Regex;

/// One token per match: an escaped brace, a `{name}` placeholder, or a
/// brace with no partner.
const TOKEN: &str = r"\{\{|\}\}|\{([^{}]*)\}|[{}]";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `source`, rejecting placeholders outside `allowed`.
    pub fn parse(name: &str, source: &str, allowed: &[&str]) -> Result<Self> {
        let token = Regex::new(TOKEN).map_err(|e| RagError::Template(e.to_string()))?;
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for cap in token.captures_iter(source) {
            let Some(whole) = cap.get(0) else { continue };
            literal.push_str(&source[last..whole.start()]);
            last = whole.end();

            match (whole.as_str(), cap.get(1)) {
                ("{{", _) => literal.push('{'),
                ("}}", _) => literal.push('}'),
                (_, Some(var)) => {
                    let var = var.as_str().trim();
                    if !allowed.contains(&var) {
                        return Err(RagError::Template(format!(
                            "{name}: unknown placeholder '{{{var}}}' (allowed: {})",
                            allowed.join(", ")
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Var(var.to_string()));
                }
                ("{", None) => {
                    return Err(RagError::Template(format!(
                        "{name}: unclosed '{{' in template"
                    )));
                }
                _ => {
                    return Err(RagError::Template(format!(
                        "{name}: single '}}' in template (use '}}}}')"
                    )));
                }
            }
        }
        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the template references `var` at least once.
    pub fn uses(&self, var: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Var(v) if v == var))
    }

    /// Substitute every placeholder. A placeholder with no value is an error.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(var) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| k == var)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            RagError::Template(format!("{}: no value for '{{{var}}}'", self.name))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let t = PromptTemplate::parse(
            "t",
            "Q: {question}\nH: {chat_history}",
            &["question", "chat_history"],
        )
        .unwrap();
        let out = t
            .render(&[("question", "why?"), ("chat_history", "user: hi")])
            .unwrap();
        assert_eq!(out, "Q: why?\nH: user: hi");
    }

    #[test]
    fn test_escaped_braces() {
        let t =
            PromptTemplate::parse("t", "{{\"topic\": \"{question}\"}}", &["question"]).unwrap();
        assert_eq!(t.render(&[("question", "x")]).unwrap(), "{\"topic\": \"x\"}");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = PromptTemplate::parse("system", "Use {contxt}", &["context"]).unwrap_err();
        assert!(err.to_string().contains("contxt"));
    }

    #[test]
    fn test_malformed() {
        assert!(PromptTemplate::parse("t", "open {question", &["question"]).is_err());
        assert!(PromptTemplate::parse("t", "stray } brace", &[]).is_err());
        assert!(PromptTemplate::parse("t", "nested { {question} }", &["question"]).is_err());
    }

    #[test]
    fn test_escaped_placeholder_stays_literal() {
        let t = PromptTemplate::parse("t", "{{question}} is {question}", &["question"]).unwrap();
        assert!(t.uses("question"));
        assert_eq!(t.render(&[("question", "why")]).unwrap(), "{question} is why");
    }

    #[test]
    fn test_padded_placeholder_name() {
        let t = PromptTemplate::parse("t", "Q: { question }", &["question"]).unwrap();
        assert_eq!(t.render(&[("question", "x")]).unwrap(), "Q: x");
    }

    #[test]
    fn test_uses_and_missing_value() {
        let t = PromptTemplate::parse("system", "Context: {context}", &["context", "question"])
            .unwrap();
        assert!(t.uses("context"));
        assert!(!t.uses("question"));
        assert!(t.render(&[]).is_err());
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let t = PromptTemplate::parse("t", "{question}", &["question"]).unwrap();
        assert_eq!(t.render(&[("question", "{context}")]).unwrap(), "{context}");
    }
}
