//! The composed chain: normalize → rewrite → classify → retrieve → generate.

use ragchain_core::config::RagConfig;
use ragchain_core::error::Result;
use ragchain_core::topic::{TopicLabel, TopicSet};
use ragchain_core::traits::model::{ChatModel, GenerateParams};
use ragchain_core::traits::VectorIndex;
use ragchain_core::types::{ChatRequest, ChatTurn, RetrievedChunk};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::classifier::TopicClassifier;
use crate::generator::{AnswerGenerator, PromptContext};
use crate::normalizer::split_conversation;
use crate::retriever::ContextRetriever;
use crate::rewriter::{QueryRewriter, RewriteDecision};

/// Intermediate results of one invocation, for inspection and evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerTrace {
    pub decision: RewriteDecision,
    pub topic: TopicLabel,
    pub chunks: Vec<RetrievedChunk>,
    pub context: String,
    pub answer: String,
}

/// A stateless conversational RAG chain. Collaborators are injected and
/// shared; every request's data stays local to its call.
pub struct RagChain {
    rewriter: QueryRewriter,
    classifier: TopicClassifier,
    retriever: ContextRetriever,
    generator: AnswerGenerator,
}

impl RagChain {
    /// Build every stage from configuration. All templates and the topic set
    /// are validated here.
    pub fn new(
        config: &RagConfig,
        model: Arc<dyn ChatModel>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        let params = GenerateParams {
            model: config.llm.model.clone(),
            parameters: config.llm.parameters.clone(),
        };
        let timeout = config.pipeline.call_timeout();
        let prompts = &config.prompts;

        let chain = Self {
            rewriter: QueryRewriter::new(
                model.clone(),
                &prompts.query_rewrite_template,
                params.clone(),
                timeout,
            )?,
            classifier: TopicClassifier::new(
                model.clone(),
                &prompts.topic_template,
                TopicSet::new(&prompts.topics)?,
                params.clone(),
                timeout,
            )?,
            retriever: ContextRetriever::new(
                index,
                config.vector_search.schema.clone(),
                config.vector_search.parameters.clone(),
                &prompts.chunk_template,
                timeout,
            )?,
            generator: AnswerGenerator::new(
                model,
                &prompts.system_prompt_template,
                params,
                timeout,
            )?,
        };
        tracing::info!(
            "🔗 Chain ready: model={} topics=[{}]",
            config.llm.model,
            chain.classifier.topics().joined()
        );
        Ok(chain)
    }

    /// Answer the last user turn of `conversation`.
    pub async fn answer(&self, conversation: &[ChatTurn]) -> Result<String> {
        Ok(self.trace(conversation).await?.answer)
    }

    /// Answer a `{"messages": [...]}` request.
    pub async fn invoke(&self, request: &ChatRequest) -> Result<String> {
        self.answer(&request.messages).await
    }

    /// Like `answer`, but also returns every intermediate result.
    pub async fn trace(&self, conversation: &[ChatTurn]) -> Result<AnswerTrace> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id, turns = conversation.len());
        self.run(conversation).instrument(span).await
    }

    async fn run(&self, conversation: &[ChatTurn]) -> Result<AnswerTrace> {
        let (question, history) = split_conversation(conversation)?;

        let decision = self.rewriter.rewrite(&question.content, history).await?;
        let query = decision.query();

        // Retrieval is filtered by the topic, so these two run in sequence.
        let topic = self.classifier.classify(query).await?;
        let chunks = self.retriever.retrieve(query, &topic).await?;
        let context = self.retriever.format_context(&chunks)?;

        let ctx = PromptContext::new(query, question.content.as_str(), history, context);
        let answer = self.generator.generate(&ctx).await?;

        tracing::info!(
            "✅ Answered (rewritten={}, topic='{}', chunks={}, history={})",
            decision.was_rewritten(),
            topic,
            chunks.len(),
            history.len()
        );

        Ok(AnswerTrace {
            decision,
            topic,
            chunks,
            context: ctx.formatted_context_block,
            answer,
        })
    }

    /// Health of both collaborators: `(model_ok, index_ok)`.
    pub async fn health_check(&self) -> (Result<bool>, Result<bool>) {
        (
            self.generator.health_check().await,
            self.retriever.health_check().await,
        )
    }
}
