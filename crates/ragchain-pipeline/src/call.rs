//! Collaborator call helpers shared by the stages.

use ragchain_core::error::{RagError, Result};
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::types::Message;
use std::future::Future;
use std::time::Duration;

/// Bound `fut` by `timeout` when one is configured.
pub(crate) async fn bounded<T>(
    stage: &'static str,
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!("⏱️ {stage} call exceeded {}s", limit.as_secs());
            RagError::Timeout {
                stage,
                secs: limit.as_secs(),
            }
        })?,
        None => fut.await,
    }
}

/// One model call, returning the completion text. A response without
/// content is a collaborator failure.
pub(crate) async fn complete(
    stage: &'static str,
    model: &dyn ChatModel,
    messages: &[Message],
    params: &GenerateParams,
    timeout: Option<Duration>,
) -> Result<String> {
    let response = bounded(stage, timeout, model.chat(messages, params)).await?;
    response.content.ok_or_else(|| {
        RagError::Provider(format!("{} returned no content for {stage}", model.name()))
    })
}

/// Shorten `text` for debug logs.
pub(crate) fn preview(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchain_core::testing::{Reply, ScriptedModel};

    #[tokio::test]
    async fn test_bounded_times_out() {
        let model = ScriptedModel::with_replies([Reply::Delayed(
            Duration::from_millis(200),
            "late".into(),
        )]);
        let err = complete(
            "rewrite",
            &model,
            &[Message::user("q")],
            &GenerateParams::default(),
            Some(Duration::from_millis(10)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::Timeout { stage: "rewrite", .. }));
        assert!(err.is_collaborator());
    }

    #[tokio::test]
    async fn test_no_timeout() {
        let model = ScriptedModel::new(["ok"]);
        let text = complete("x", &model, &[], &GenerateParams::default(), None)
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(200);
        assert_eq!(preview(&long).chars().count(), 121);
    }
}
