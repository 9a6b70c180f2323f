//! The retrieval-augmented answer engine.
//!
//! Answering is a decision procedure layered on retrieval. Two thresholds
//! apply, both inclusive (`>=`):
//!
//! - `min_similarity`: admission floor. If candidates exist but the best
//!   falls below it, the engine declines without calling the model.
//! - `context_similarity`: grounding floor. Candidates at or above it are
//!   quoted as context; when none qualify (but admission passed) the model
//!   is still asked, on general knowledge alone.
//!
//! Declining is a normal outcome carried in [`RagResponse`]; provider and
//! store failures are errors and are never converted into declines here.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::completion::CompletionProvider;
use crate::config::RagConfig;
use crate::document::RagResponse;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::store::VectorStore;

/// Decline text when retrieval returns zero candidates: the corpus has
/// nothing at all for this query.
pub const NO_MATCH_MESSAGE: &str =
    "I couldn't find any relevant information in my knowledge base to answer your question.";

/// Decline text when candidates exist but the best falls below the
/// admission floor: the corpus only has unrelated content. Deliberately
/// worded differently from [`NO_MATCH_MESSAGE`] so callers can tell the two
/// apart.
pub const LOW_CONFIDENCE_MESSAGE: &str =
    "I don't have enough relevant information to answer your question. \
     Could you please rephrase your question or ask about something else?";

const GROUNDED_SYSTEM_PROMPT: &str =
    "Please provide a clear and concise response based on the following context \
     under 300 characters. If the context isn't relevant, you can ignore it and \
     answer based on your general knowledge.";

const FALLBACK_SYSTEM_PROMPT: &str =
    "Please provide a clear and concise response under 300 characters based on \
     your general knowledge.";

/// Anything that can answer a free-text question with a [`RagResponse`].
///
/// The batch orchestrator and the mail-facing layer depend on this trait
/// rather than on [`AnswerEngine`] directly, so tests can substitute a
/// scripted implementation.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer a question, or decline with one of the fixed messages.
    async fn answer(&self, question: &str) -> Result<RagResponse>;
}

/// The production [`Answerer`]: embed, retrieve, gate, generate.
pub struct AnswerEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    completion: Arc<dyn CompletionProvider>,
    config: RagConfig,
}

impl AnswerEngine {
    /// Create an engine over the given store and providers.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
        config: RagConfig,
    ) -> Self {
        Self { store, embedder, completion, config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

#[async_trait]
impl Answerer for AnswerEngine {
    async fn answer(&self, question: &str) -> Result<RagResponse> {
        let query_embedding = self.embedder.embed(question).await?;

        // No floor at the store: the engine needs the distinction between
        // "zero candidates" and "best candidate below the floor".
        let matches =
            self.store.query(&query_embedding, self.config.top_k, -1.0).await?;

        if matches.is_empty() {
            info!("no candidates retrieved, declining");
            return Ok(RagResponse {
                text: NO_MATCH_MESSAGE.to_string(),
                max_similarity: None,
                document_url: None,
            });
        }

        // Matches arrive sorted descending; the first is the best.
        let best = &matches[0];
        let max_similarity = best.similarity;
        debug!(candidates = matches.len(), max_similarity, "retrieved candidates");

        if max_similarity < self.config.min_similarity {
            info!(max_similarity, floor = self.config.min_similarity, "below floor, declining");
            return Ok(RagResponse {
                text: LOW_CONFIDENCE_MESSAGE.to_string(),
                max_similarity: Some(max_similarity),
                document_url: None,
            });
        }

        let context: Vec<&str> = matches
            .iter()
            .filter(|m| m.similarity >= self.config.context_similarity)
            .map(|m| m.text.as_str())
            .collect();

        let (system, user, document_url) = if context.is_empty() {
            debug!("no match cleared the context floor, answering from general knowledge");
            (FALLBACK_SYSTEM_PROMPT, format!("Question: {question}"), None)
        } else {
            let context_block = context.join("\n\n");
            let document_url = best.document.source_reference().map(str::to_string);
            (
                GROUNDED_SYSTEM_PROMPT,
                format!("Context:\n{context_block}\n\nQuestion: {question}"),
                document_url,
            )
        };

        let text =
            self.completion.complete(system, &user, self.config.max_answer_tokens).await?;
        info!(max_similarity, grounded = document_url.is_some(), "generated answer");

        Ok(RagResponse { text, max_similarity: Some(max_similarity), document_url })
    }
}
