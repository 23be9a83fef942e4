//! Deterministic collaborator fakes for tests.
//!
//! `ScriptedModel` answers each `chat` call with the next scripted reply and
//! records the exact messages it was sent. No network, fully reproducible.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{RagError, Result};
use crate::traits::model::{ChatModel, GenerateParams};
use crate::types::{Message, ProviderResponse};

/// One scripted reaction to a `chat` call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Fail with `RagError::Provider`.
    Fail(String),
    /// Sleep before answering, to exercise timeouts.
    Delayed(Duration, String),
}

/// A recorded `chat` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub params: GenerateParams,
}

/// Fake `ChatModel` replaying a fixed script.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(replies.into_iter().map(|s| Reply::Text(s.into())))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        self.calls.lock().await.push(RecordedCall {
            messages: messages.to_vec(),
            params: params.clone(),
        });
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| RagError::Provider("scripted model has no replies left".into()))?;
        match reply {
            Reply::Text(text) => Ok(ProviderResponse::text(text)),
            Reply::Fail(msg) => Err(RagError::Provider(msg)),
            Reply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(ProviderResponse::text(text))
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let model = ScriptedModel::new(["one", "two"]);
        let params = GenerateParams::default();
        let r1 = model.chat(&[Message::user("a")], &params).await.unwrap();
        let r2 = model.chat(&[Message::user("b")], &params).await.unwrap();
        assert_eq!(r1.content.as_deref(), Some("one"));
        assert_eq!(r2.content.as_deref(), Some("two"));
        assert!(model.chat(&[], &params).await.is_err());

        let calls = model.calls().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].messages[0].content, "b");
    }
}
