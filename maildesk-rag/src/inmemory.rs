//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency store
//! backed by `Vec`s behind a `tokio::sync::RwLock`. It enforces the same
//! contract as the Postgres backend (fixed dimension, identity uniqueness,
//! insertion-order ties) and is intended for tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::document::{Chunk, DocumentIdentity, DocumentMatch, SourceDocument};
use crate::error::{RagError, Result};
use crate::store::VectorStore;

/// An in-memory [`VectorStore`] with cosine-similarity search.
///
/// Chunks are kept in insertion order, which doubles as the tie-break order
/// for equal similarities (the sort is stable).
pub struct InMemoryVectorStore {
    dimensions: usize,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    documents: Vec<SourceDocument>,
    chunks: Vec<Chunk>,
    next_document_id: i64,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl InMemoryVectorStore {
    /// Create an empty store accepting embeddings of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, state: RwLock::new(State { next_document_id: 1, ..State::default() }) }
    }

    fn store_error(message: impl Into<String>) -> RagError {
        RagError::Store { backend: "InMemory".into(), message: message.into() }
    }

    fn identity_matches(document: &SourceDocument, identity: &DocumentIdentity) -> bool {
        match identity {
            DocumentIdentity::Filepath(path) => document.filepath.as_deref() == Some(path),
            DocumentIdentity::Url(url) => document.url.as_deref() == Some(url),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn find_document(&self, identity: &DocumentIdentity) -> Result<Option<SourceDocument>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .find(|document| Self::identity_matches(document, identity))
            .cloned())
    }

    async fn create_document(&self, identity: &DocumentIdentity) -> Result<SourceDocument> {
        let mut state = self.state.write().await;
        if let Some(existing) =
            state.documents.iter().find(|document| Self::identity_matches(document, identity))
        {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let (filepath, url) = match identity {
            DocumentIdentity::Filepath(path) => (Some(path.clone()), None),
            DocumentIdentity::Url(url) => (None, Some(url.clone())),
        };
        let document = SourceDocument {
            id: state.next_document_id,
            filepath,
            url,
            processed: false,
            created_at: now,
            updated_at: now,
        };
        state.next_document_id += 1;
        state.documents.push(document.clone());
        Ok(document)
    }

    async fn mark_processed(&self, document_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .iter_mut()
            .find(|document| document.id == document_id)
            .ok_or_else(|| Self::store_error(format!("unknown document id {document_id}")))?;
        document.processed = true;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.len() != self.dimensions {
            return Err(Self::store_error(format!(
                "embedding dimension {} does not match store dimension {}",
                chunk.embedding.len(),
                self.dimensions
            )));
        }

        let mut state = self.state.write().await;
        if !state.documents.iter().any(|document| document.id == chunk.document_id) {
            return Err(Self::store_error(format!(
                "chunk references unknown document id {}",
                chunk.document_id
            )));
        }
        state.chunks.push(chunk.clone());
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<DocumentMatch>> {
        let state = self.state.read().await;

        let mut matches: Vec<DocumentMatch> = state
            .chunks
            .iter()
            .filter_map(|chunk| {
                let similarity = cosine_similarity(&chunk.embedding, embedding);
                if similarity < min_similarity {
                    return None;
                }
                let document = state
                    .documents
                    .iter()
                    .find(|document| document.id == chunk.document_id)?
                    .clone();
                Some(DocumentMatch {
                    text: chunk.text.clone(),
                    similarity,
                    metadata: chunk.metadata.clone(),
                    document,
                })
            })
            .collect();

        // Stable sort keeps insertion order for equal similarities.
        matches.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn delete_by_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(position) = state.chunks.iter().position(|chunk| chunk.text == text) {
            state.chunks.remove(position);
        }
        Ok(())
    }

    async fn count_chunks(&self) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chunk(text: &str, embedding: Vec<f32>, document_id: i64) -> Chunk {
        Chunk { text: text.to_string(), embedding, metadata: HashMap::new(), document_id }
    }

    async fn store_with_document() -> (InMemoryVectorStore, SourceDocument) {
        let store = InMemoryVectorStore::new(3);
        let document = store
            .create_document(&DocumentIdentity::Filepath("docs/a.md".to_string()))
            .await
            .unwrap();
        (store, document)
    }

    #[tokio::test]
    async fn insert_rejects_dimension_mismatch() {
        let (store, document) = store_with_document().await;
        let err = store
            .insert_chunk(&chunk("bad", vec![1.0, 0.0], document.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Store { .. }));

        store.insert_chunk(&chunk("good", vec![1.0, 0.0, 0.0], document.id)).await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_unknown_document() {
        let store = InMemoryVectorStore::new(3);
        let err = store.insert_chunk(&chunk("orphan", vec![1.0, 0.0, 0.0], 42)).await.unwrap_err();
        assert!(matches!(err, RagError::Store { .. }));
    }

    #[tokio::test]
    async fn create_document_is_create_or_get() {
        let (store, document) = store_with_document().await;
        let again = store
            .create_document(&DocumentIdentity::Filepath("docs/a.md".to_string()))
            .await
            .unwrap();
        assert_eq!(again.id, document.id);
    }

    #[tokio::test]
    async fn self_query_scores_near_one() {
        let (store, document) = store_with_document().await;
        let embedding = vec![0.3, 0.5, 0.7];
        store.insert_chunk(&chunk("round trip", embedding.clone(), document.id)).await.unwrap();

        let matches = store.query(&embedding, 5, -1.0).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].similarity > 0.999);
        assert_eq!(matches[0].text, "round trip");
    }

    #[tokio::test]
    async fn query_floor_is_inclusive() {
        let (store, document) = store_with_document().await;
        // Orthogonal to the query: cosine similarity is exactly 0.0.
        store.insert_chunk(&chunk("orthogonal", vec![0.0, 1.0, 0.0], document.id)).await.unwrap();

        let query = [1.0, 0.0, 0.0];
        let at_floor = store.query(&query, 5, 0.0).await.unwrap();
        assert_eq!(at_floor.len(), 1);

        let above_floor = store.query(&query, 5, 0.001).await.unwrap();
        assert!(above_floor.is_empty());
    }

    #[tokio::test]
    async fn equal_similarities_keep_insertion_order() {
        let (store, document) = store_with_document().await;
        store.insert_chunk(&chunk("first", vec![0.0, 1.0, 0.0], document.id)).await.unwrap();
        store.insert_chunk(&chunk("second", vec![0.0, 0.0, 1.0], document.id)).await.unwrap();

        // Both are orthogonal to the query and tie at similarity 0.0.
        let matches = store.query(&[1.0, 0.0, 0.0], 5, -1.0).await.unwrap();
        let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn delete_by_text_removes_at_most_one() {
        let (store, document) = store_with_document().await;
        let embedding = vec![1.0, 0.0, 0.0];
        store.insert_chunk(&chunk("dup", embedding.clone(), document.id)).await.unwrap();
        store.insert_chunk(&chunk("dup", embedding.clone(), document.id)).await.unwrap();

        store.delete_by_text("dup").await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 1);

        // Deleting a missing text is a no-op, not an error.
        store.delete_by_text("absent").await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 1);
    }
}
