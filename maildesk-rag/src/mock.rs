//! Deterministic mock providers for tests and offline development.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An [`EmbeddingProvider`] that derives vectors from the input text itself.
///
/// The same text always embeds to the same unit-length vector, so a chunk
/// queried with its own text scores a cosine similarity of ~1.0. Specific
/// texts can be pinned to hand-picked vectors with [`with_response`]
/// to construct exact similarity geometries in tests.
///
/// [`with_response`]: MockEmbedder::with_response
pub struct MockEmbedder {
    dimensions: usize,
    responses: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl MockEmbedder {
    /// Create a mock embedder producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, responses: HashMap::new(), calls: AtomicUsize::new(0), fail_after: None }
    }

    /// Pin an exact vector to be returned for an exact input text.
    pub fn with_response(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.responses.insert(text.into(), embedding);
        self
    }

    /// Fail every call after the first `calls` successful ones.
    ///
    /// Used to simulate a provider outage (or a crash) part-way through an
    /// ingestion run.
    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Number of `embed` calls made so far, successful or not.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn derive(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (index, byte) in text.bytes().enumerate() {
            vector[index % self.dimensions] += f32::from(byte) / 255.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if call >= limit {
                return Err(RagError::Embedding {
                    provider: "Mock".into(),
                    message: "simulated provider failure".into(),
                });
            }
        }
        if let Some(pinned) = self.responses.get(text) {
            return Ok(pinned.clone());
        }
        Ok(self.derive(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`CompletionProvider`] that returns a fixed reply, counts calls, and
/// records the last prompt pair it was given.
pub struct MockCompletion {
    reply: String,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<(String, String)>>,
    fail: bool,
}

impl MockCompletion {
    /// Create a mock that answers every prompt with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            fail: false,
        }
    }

    /// Create a mock that fails every call with a completion error.
    pub fn failing() -> Self {
        let mut mock = Self::new("");
        mock.fail = true;
        mock
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `(system, user)` pair of the most recent call, if any.
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.last_prompt.lock().expect("prompt mutex poisoned").clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, system: &str, user: &str, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("prompt mutex poisoned") =
            Some((system.to_string(), user.to_string()));
        if self.fail {
            return Err(RagError::Completion {
                provider: "Mock".into(),
                message: "simulated provider failure".into(),
            });
        }
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let embedder = MockEmbedder::new(8);
        let a = embedder.embed("the quick brown fox").await.unwrap();
        let b = embedder.embed("the quick brown fox").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn pinned_responses_win_over_derivation() {
        let embedder = MockEmbedder::new(3).with_response("paris", vec![1.0, 0.0, 0.0]);
        assert_eq!(embedder.embed("paris").await.unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn failing_after_trips_at_the_configured_call() {
        let embedder = MockEmbedder::new(3).failing_after(2);
        assert!(embedder.embed("one").await.is_ok());
        assert!(embedder.embed("two").await.is_ok());
        assert!(embedder.embed("three").await.is_err());
    }
}
