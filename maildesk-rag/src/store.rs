//! Vector store trait: document registry plus chunk storage and search.
//!
//! A store persists [`SourceDocument`] rows keyed by identity and the
//! [`Chunk`]s they own, and answers cosine-similarity queries over the
//! stored vectors. The embedding dimension is fixed per store instance.

use async_trait::async_trait;

use crate::document::{Chunk, DocumentIdentity, DocumentMatch, SourceDocument};
use crate::error::Result;

/// A storage backend for documents and their embedded chunks.
///
/// Implementations guarantee:
/// - at most one document row per [`DocumentIdentity`];
/// - every stored embedding has the store's configured dimension;
/// - query results are ordered by descending similarity with ties broken
///   by insertion order, and only rows at or above the floor are returned.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The embedding dimension every stored vector must have.
    fn dimensions(&self) -> usize;

    /// Look up the document registered under the given identity, if any.
    async fn find_document(&self, identity: &DocumentIdentity) -> Result<Option<SourceDocument>>;

    /// Register a document under the given identity, or return the existing
    /// row when the identity is already taken (create-or-get).
    async fn create_document(&self, identity: &DocumentIdentity) -> Result<SourceDocument>;

    /// Mark a document as fully processed. Called only after every one of
    /// its chunks has been durably stored.
    async fn mark_processed(&self, document_id: i64) -> Result<()>;

    /// Insert a single chunk.
    ///
    /// # Errors
    ///
    /// Returns a store error if the embedding length mismatches
    /// [`dimensions()`](VectorStore::dimensions) or `chunk.document_id`
    /// does not reference a registered document.
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Search for chunks similar to the query embedding.
    ///
    /// Returns at most `limit` matches with
    /// `similarity >= min_similarity` (inclusive), ordered by descending
    /// cosine similarity. An empty result is not an error.
    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<DocumentMatch>>;

    /// Delete at most one chunk whose stored text equals `text` exactly.
    /// No-op when nothing matches.
    async fn delete_by_text(&self, text: &str) -> Result<()>;

    /// Total number of stored chunks.
    async fn count_chunks(&self) -> Result<usize>;
}
