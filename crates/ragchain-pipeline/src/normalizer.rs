//! Split a conversation into the question being answered and its history.

use ragchain_core::error::{RagError, Result};
use ragchain_core::types::{ChatTurn, TurnRole};

/// Returns `(question, history)`: the last turn, and every turn before it in
/// original order. The last turn must be authored by the user.
pub fn split_conversation(turns: &[ChatTurn]) -> Result<(&ChatTurn, &[ChatTurn])> {
    let (question, history) = turns
        .split_last()
        .ok_or_else(|| RagError::InvalidInput("conversation is empty".into()))?;

    if question.role != TurnRole::User {
        return Err(RagError::InvalidInput(format!(
            "last turn must be authored by the user, got '{}'",
            question.role
        )));
    }
    Ok((question, history))
}
