//! Query rewriting: turn a follow-up question into a standalone query.
//!
//! "How does it scale?" after "What is spark?" becomes something like
//! "How does Apache Spark scale?", which retrieves far better.

use ragchain_core::error::{RagError, Result};
use ragchain_core::prompt::PromptTemplate;
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::types::{ChatTurn, Message};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::call;

pub const REWRITE_VARS: &[&str] = &["chat_history", "question"];

/// Outcome of the rewrite stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "query", rename_all = "snake_case")]
pub enum RewriteDecision {
    /// History was present; the model produced this standalone query.
    Rewritten(String),
    /// No history; the question is used as-is and the model was not called.
    Passthrough(String),
}

impl RewriteDecision {
    /// The query used for classification and retrieval.
    pub fn query(&self) -> &str {
        match self {
            RewriteDecision::Rewritten(q) | RewriteDecision::Passthrough(q) => q,
        }
    }

    pub fn was_rewritten(&self) -> bool {
        matches!(self, RewriteDecision::Rewritten(_))
    }
}

/// Serialize history as one `role: content` line per turn.
pub fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct QueryRewriter {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    params: GenerateParams,
    timeout: Option<Duration>,
}

impl QueryRewriter {
    pub fn new(
        model: Arc<dyn ChatModel>,
        template: &str,
        params: GenerateParams,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let template = PromptTemplate::parse("query_rewrite_template", template, REWRITE_VARS)?;
        if !template.uses("question") {
            return Err(RagError::Config(
                "query_rewrite_template must reference {question}".into(),
            ));
        }
        Ok(Self {
            model,
            template,
            params,
            timeout,
        })
    }

    /// Rewrite `question` against `history`. Empty history short-circuits to
    /// `Passthrough` without touching the model. No internal retries.
    pub async fn rewrite(&self, question: &str, history: &[ChatTurn]) -> Result<RewriteDecision> {
        if history.is_empty() {
            tracing::debug!("↪️ No history, using question as-is");
            return Ok(RewriteDecision::Passthrough(question.to_string()));
        }

        let chat_history = format_history(history);
        let prompt = self.template.render(&[
            ("chat_history", chat_history.as_str()),
            ("question", question),
        ])?;

        let raw = call::complete(
            "rewrite",
            self.model.as_ref(),
            &[Message::user(prompt)],
            &self.params,
            self.timeout,
        )
        .await?;

        let query = raw.trim();
        if query.is_empty() {
            return Err(RagError::Provider(format!(
                "{} returned an empty rewritten query",
                self.model.name()
            )));
        }
        tracing::debug!(
            "✏️ Rewrote {:?} → {:?}",
            call::preview(question),
            call::preview(query)
        );
        Ok(RewriteDecision::Rewritten(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchain_core::config::PromptConfig;
    use ragchain_core::testing::ScriptedModel;

    fn rewriter(model: Arc<ScriptedModel>) -> QueryRewriter {
        QueryRewriter::new(
            model,
            &PromptConfig::default().query_rewrite_template,
            GenerateParams::default(),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_no_history_passthrough_without_call() {
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let decision = rewriter(model.clone())
            .rewrite("What is spark?", &[])
            .await
            .unwrap();
        assert_eq!(decision, RewriteDecision::Passthrough("What is spark?".into()));
        assert!(!decision.was_rewritten());
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_history_triggers_one_call_and_trims() {
        let model = Arc::new(ScriptedModel::new(["  How does Apache Spark scale?\n"]));
        let history = vec![
            ChatTurn::user("What is spark?"),
            ChatTurn::assistant("Spark is a distributed compute engine."),
        ];
        let decision = rewriter(model.clone())
            .rewrite("How does it scale?", &history)
            .await
            .unwrap();
        assert_eq!(decision.query(), "How does Apache Spark scale?");
        assert!(decision.was_rewritten());

        let calls = model.calls().await;
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0].messages[0].content;
        assert!(prompt.contains(
            "user: What is spark?\nassistant: Spark is a distributed compute engine."
        ));
        assert!(prompt.contains("Question: How does it scale?"));
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let model = Arc::new(ScriptedModel::with_replies([
            ragchain_core::testing::Reply::Fail("503".into()),
        ]));
        let err = rewriter(model.clone())
            .rewrite("q", &[ChatTurn::user("a"), ChatTurn::assistant("b")])
            .await
            .unwrap_err();
        assert!(err.is_collaborator());
        assert_eq!(model.call_count().await, 1);
    }

    #[test]
    fn test_template_must_use_question() {
        let model = Arc::new(ScriptedModel::default());
        assert!(
            QueryRewriter::new(
                model,
                "History: {chat_history}",
                GenerateParams::default(),
                None
            )
            .is_err()
        );
    }

    #[test]
    fn test_decision_serializes_tagged() {
        let json = serde_json::to_value(RewriteDecision::Passthrough("q".into())).unwrap();
        assert_eq!(json["kind"], "passthrough");
        assert_eq!(json["query"], "q");
    }
}
