//! Final answer generation.
//!
//! Prompt layout: system instructions (optionally embedding the context
//! block), the prior turns as user/assistant messages in order, then the
//! user's original question. The rephrased question is never shown to the
//! model as the user's words.

use ragchain_core::error::Result;
use ragchain_core::prompt::PromptTemplate;
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::types::{ChatTurn, Message};
use std::sync::Arc;
use std::time::Duration;

use crate::call;

pub const SYSTEM_VARS: &[&str] = &["context", "question"];

/// Everything the generator needs for one request. Built once, consumed once.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Query used for classification and retrieval; not sent to the model here.
    pub rephrased_question: String,
    pub original_question: String,
    pub formatted_history: Vec<Message>,
    pub formatted_context_block: String,
}

impl PromptContext {
    pub fn new(
        rephrased_question: impl Into<String>,
        original_question: impl Into<String>,
        history: &[ChatTurn],
        formatted_context_block: String,
    ) -> Self {
        Self {
            rephrased_question: rephrased_question.into(),
            original_question: original_question.into(),
            formatted_history: history.iter().map(Message::from).collect(),
            formatted_context_block,
        }
    }
}

pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    system_template: PromptTemplate,
    params: GenerateParams,
    timeout: Option<Duration>,
}

impl AnswerGenerator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        system_template: &str,
        params: GenerateParams,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let system_template =
            PromptTemplate::parse("system_prompt_template", system_template, SYSTEM_VARS)?;
        if !system_template.uses("context") {
            tracing::warn!(
                "⚠️ system_prompt_template has no {{context}}; \
                 retrieved chunks will not reach the model"
            );
        }
        Ok(Self {
            model,
            system_template,
            params,
            timeout,
        })
    }

    pub fn build_messages(&self, ctx: &PromptContext) -> Result<Vec<Message>> {
        let system = self.system_template.render(&[
            ("context", ctx.formatted_context_block.as_str()),
            ("question", ctx.original_question.as_str()),
        ])?;

        let mut messages = Vec::with_capacity(ctx.formatted_history.len() + 2);
        messages.push(Message::system(system));
        messages.extend(ctx.formatted_history.iter().cloned());
        messages.push(Message::user(ctx.original_question.clone()));
        Ok(messages)
    }

    /// Ask the model; the completion is returned untouched.
    pub async fn generate(&self, ctx: &PromptContext) -> Result<String> {
        let messages = self.build_messages(ctx)?;
        call::complete(
            "generate",
            self.model.as_ref(),
            &messages,
            &self.params,
            self.timeout,
        )
        .await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.model.health_check().await
    }
}
