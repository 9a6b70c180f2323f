//! Configuration for the retrieval core.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters shared by ingestion and the answer engine.
///
/// Three similarity thresholds govern behavior at different layers:
/// `min_similarity` decides whether an answer is attempted at all, and
/// `context_similarity` decides which matches are quoted as grounding
/// context. The display-side threshold lives with the batch orchestrator,
/// not here. When only one knob is wanted, leave `context_similarity`
/// unset and it collapses onto `min_similarity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of candidate matches fetched per query.
    pub top_k: usize,
    /// Minimum best-match similarity below which the engine declines outright.
    pub min_similarity: f32,
    /// Minimum similarity for a match to be included as grounding context.
    pub context_similarity: f32,
    /// Output-token cap passed to the completion provider per answer.
    pub max_answer_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 100,
            top_k: 5,
            min_similarity: 0.2,
            context_similarity: 0.2,
            max_answer_tokens: 100,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
    context_similarity: Option<f32>,
}

impl RagConfigBuilder {
    /// Set the target chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of candidate matches fetched per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the admission floor below which the engine declines to answer.
    pub fn min_similarity(mut self, threshold: f32) -> Self {
        self.config.min_similarity = threshold;
        self
    }

    /// Set the context-inclusion threshold.
    ///
    /// Defaults to the value of `min_similarity` when not set.
    pub fn context_similarity(mut self, threshold: f32) -> Self {
        self.context_similarity = Some(threshold);
        self
    }

    /// Set the output-token cap passed to the completion provider.
    pub fn max_answer_tokens(mut self, tokens: u32) -> Self {
        self.config.max_answer_tokens = tokens;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_answer_tokens == 0`
    /// - either similarity threshold is outside `[-1, 1]`
    pub fn build(self) -> Result<RagConfig> {
        let mut config = self.config;
        config.context_similarity = self.context_similarity.unwrap_or(config.min_similarity);

        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if config.max_answer_tokens == 0 {
            return Err(RagError::Config("max_answer_tokens must be greater than zero".to_string()));
        }
        for (name, value) in
            [("min_similarity", config.min_similarity), ("context_similarity", config.context_similarity)]
        {
            if !(-1.0..=1.0).contains(&value) {
                return Err(RagError::Config(format!("{name} ({value}) must be within [-1, 1]")));
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_similarity_defaults_to_min_similarity() {
        let config = RagConfig::builder().min_similarity(0.4).build().unwrap();
        assert_eq!(config.context_similarity, 0.4);
    }

    #[test]
    fn split_thresholds_are_kept_independent() {
        let config =
            RagConfig::builder().min_similarity(0.2).context_similarity(0.6).build().unwrap();
        assert_eq!(config.min_similarity, 0.2);
        assert_eq!(config.context_similarity, 0.6);
    }

    #[test]
    fn rejects_overlap_not_less_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn rejects_zero_top_k() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(RagConfig::builder().min_similarity(1.5).build().is_err());
    }
}
