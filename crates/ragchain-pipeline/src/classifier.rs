//! Topic classification against the closed label set.
//!
//! The model's answer only becomes a retrieval filter if it names a
//! configured label (trim + case-fold + exact match). Anything else is a
//! `ClassificationAmbiguity` error: the chain fails closed instead of
//! searching with a filter value that silently matches nothing.

use ragchain_core::error::Result;
use ragchain_core::prompt::PromptTemplate;
use ragchain_core::topic::{TopicLabel, TopicSet};
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::types::Message;
use std::sync::Arc;
use std::time::Duration;

use crate::call;

pub const TOPIC_VARS: &[&str] = &["topics", "question"];

pub struct TopicClassifier {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    topics: TopicSet,
    params: GenerateParams,
    timeout: Option<Duration>,
}

impl TopicClassifier {
    pub fn new(
        model: Arc<dyn ChatModel>,
        template: &str,
        topics: TopicSet,
        params: GenerateParams,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            model,
            template: PromptTemplate::parse("topic_template", template, TOPIC_VARS)?,
            topics,
            params,
            timeout,
        })
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub async fn classify(&self, query: &str) -> Result<TopicLabel> {
        let topics = self.topics.joined();
        let prompt = self
            .template
            .render(&[("topics", topics.as_str()), ("question", query)])?;

        let raw = call::complete(
            "classify",
            self.model.as_ref(),
            &[Message::user(prompt)],
            &self.params,
            self.timeout,
        )
        .await?;

        match self.topics.resolve(&raw) {
            Ok(label) => {
                tracing::debug!("🏷️ Topic: {label}");
                Ok(label)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Unrecognised topic from {}: {:?}",
                    self.model.name(),
                    call::preview(raw.trim())
                );
                Err(e)
            }
        }
    }
}
