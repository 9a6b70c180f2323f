//! Data types for source documents, chunks, retrieval matches, and answers.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The uniqueness key of an ingested source: a local file path or a URL.
///
/// Exactly one variant applies per document. Re-ingesting the same identity
/// is a no-op once the document has been fully processed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentIdentity {
    /// A document ingested from a local file.
    Filepath(String),
    /// A document ingested from a remote URL.
    Url(String),
}

impl DocumentIdentity {
    /// The raw identity string (path or URL).
    pub fn as_str(&self) -> &str {
        match self {
            DocumentIdentity::Filepath(value) | DocumentIdentity::Url(value) => value,
        }
    }

    /// A short human-readable source name used in chunk metadata.
    ///
    /// For file paths this is the final path component; URLs are kept whole.
    pub fn source_name(&self) -> String {
        match self {
            DocumentIdentity::Filepath(path) => Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone()),
            DocumentIdentity::Url(url) => url.clone(),
        }
    }
}

/// A registered source document and its processing state.
///
/// One row exists per [`DocumentIdentity`]. The `processed` flag flips to
/// `true` only after every chunk of the document has been durably stored,
/// so an interrupted ingestion run is always re-runnable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Store-assigned identifier.
    pub id: i64,
    /// Local path identity, when ingested from a file.
    pub filepath: Option<String>,
    /// URL identity, when ingested from a remote source.
    pub url: Option<String>,
    /// Whether all chunks of this document have been stored.
    pub processed: bool,
    /// When the document row was created.
    pub created_at: DateTime<Utc>,
    /// When the document row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SourceDocument {
    /// The reference surfaced in answers: the URL when present, else the path.
    pub fn source_reference(&self) -> Option<&str> {
        self.url.as_deref().or(self.filepath.as_deref())
    }
}

/// A segment of a document's extracted text with its vector embedding.
///
/// `text` is the exact string that produced `embedding`; the two are never
/// mutated independently after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk. Non-empty.
    pub text: String,
    /// The embedding vector; its length must equal the store's dimension.
    pub embedding: Vec<f32>,
    /// Open key-value metadata (`source`, `chunk_index`, `total_chunks`, ...).
    pub metadata: HashMap<String, String>,
    /// The owning [`SourceDocument`].
    pub document_id: i64,
}

/// One ranked retrieval result. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct DocumentMatch {
    /// The matched chunk text.
    pub text: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
    /// The chunk's metadata.
    pub metadata: HashMap<String, String>,
    /// The document that owns the matched chunk.
    pub document: SourceDocument,
}

/// The outcome of one answer attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagResponse {
    /// The generated answer, or a decline message.
    pub text: String,
    /// Best similarity among retrieved candidates; `None` with zero candidates.
    pub max_similarity: Option<f32>,
    /// Source reference of the best match, set only on the grounded path.
    pub document_url: Option<String>,
}
