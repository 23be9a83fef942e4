//! Request-scoped data passed between the chain stages and the collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RagError;

/// Author of a turn in the incoming conversation.
///
/// Only `user` and `assistant` are accepted; anything else is rejected when
/// parsed or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TurnRole {
    User,
    Assistant,
}

impl FromStr for TurnRole {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(RagError::InvalidInput(format!(
                "unsupported role '{other}' (expected 'user' or 'assistant')"
            ))),
        }
    }
}

impl TryFrom<String> for TurnRole {
    type Error = RagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// The `{"messages": [...]}` request body accepted by the chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Parse a request body, mapping malformed JSON or unknown roles to `InvalidInput`.
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| RagError::InvalidInput(format!("malformed chat request: {e}")))
    }
}

/// Role of a message sent to the language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// A chat-completions message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.into(),
            content: turn.content.clone(),
        }
    }
}

/// Token accounting reported by a provider, when available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw completion returned by a `ChatModel`.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// A document chunk returned by the vector index, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub primary_key: String,
    pub text: String,
    pub source_uri: String,
    pub topic: String,
    pub title: String,
    /// Similarity score as reported by the index, if any.
    #[serde(default)]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<TurnRole>().unwrap(), TurnRole::User);
        assert_eq!("assistant".parse::<TurnRole>().unwrap(), TurnRole::Assistant);
        let err = "system".parse::<TurnRole>().unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[test]
    fn test_request_rejects_unknown_role() {
        let raw = r#"{"messages": [{"role": "tool", "content": "hi"}]}"#;
        let err = ChatRequest::from_json(raw).unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
        assert!(err.to_string().contains("tool"));
    }

    #[test]
    fn test_request_roundtrip_shape() {
        let raw = r#"{"messages": [
            {"role": "user", "content": "What is spark?"},
            {"role": "assistant", "content": "A compute engine."}
        ]}"#;
        let req = ChatRequest::from_json(raw).unwrap();
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[1], ChatTurn::assistant("A compute engine."));

        let json = serde_json::to_value(&req.messages[0]).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_message_from_turn() {
        let msg = Message::from(&ChatTurn::assistant("ok"));
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "assistant");
    }
}
