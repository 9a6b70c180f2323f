//! Idempotent document ingestion: extract, chunk, embed, store.
//!
//! Embedding calls are the dominant (rate-limited, billed) cost, so the
//! ingestor checks the document registry before touching a source: a fully
//! processed identity returns immediately without re-reading or
//! re-embedding anything. The `processed` flag flips only after every chunk
//! insert succeeded, which makes a partially failed run safe to re-run
//! (at-least-once: a retry may duplicate chunks from the failed attempt).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::TextChunker;
use crate::config::RagConfig;
use crate::document::{Chunk, DocumentIdentity};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::store::VectorStore;

#[cfg(feature = "pdf")]
use crate::extract::PdfTextExtractor;

/// The result of one [`DocumentIngestor::ingest_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The identity was already fully processed; nothing was read or embedded.
    AlreadyProcessed,
    /// The document was ingested with the given number of chunks.
    Ingested {
        /// Number of chunks stored for this document.
        chunks: usize,
    },
}

/// Counters for one [`DocumentIngestor::ingest_all`] sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Files ingested in this sweep.
    pub ingested: usize,
    /// Files skipped because they were already processed.
    pub skipped: usize,
    /// Files that failed; the sweep continued past them.
    pub failed: usize,
}

/// Ingests source documents into a [`VectorStore`].
pub struct DocumentIngestor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
}

impl DocumentIngestor {
    /// Create an ingestor; chunking parameters come from `config`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RagConfig,
    ) -> Self {
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap);
        Self { store, embedder, chunker }
    }

    /// Ingest a single source document, idempotently per identity.
    ///
    /// `path` locates the content to read (for URL identities this is the
    /// caller's downloaded temp file); `identity` is the uniqueness key the
    /// document is registered under.
    ///
    /// Chunks are embedded and inserted one at a time in split order, so
    /// `chunk_index` metadata is contiguous and a failure is attributable
    /// to a specific chunk. The document is marked processed last.
    pub async fn ingest_file(
        &self,
        identity: DocumentIdentity,
        path: &Path,
        extractor: &dyn TextExtractor,
    ) -> Result<IngestOutcome> {
        let document = match self.store.find_document(&identity).await? {
            Some(document) if document.processed => {
                info!(source = identity.as_str(), "skipping already processed document");
                return Ok(IngestOutcome::AlreadyProcessed);
            }
            Some(document) => document,
            None => self.store.create_document(&identity).await?,
        };

        let text = extractor.extract(path)?;
        let chunks = self.chunker.split(&text);
        let total_chunks = chunks.len();
        info!(source = identity.as_str(), chars = text.len(), total_chunks, "extracted source");

        let source_name = identity.source_name();
        for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk_text).await?;

            let mut metadata = HashMap::new();
            metadata.insert("source".to_string(), source_name.clone());
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());
            metadata.insert("total_chunks".to_string(), total_chunks.to_string());

            self.store
                .insert_chunk(&Chunk {
                    text: chunk_text,
                    embedding,
                    metadata,
                    document_id: document.id,
                })
                .await?;
        }

        self.store.mark_processed(document.id).await?;
        info!(source = identity.as_str(), total_chunks, "ingested document");
        Ok(IngestOutcome::Ingested { chunks: total_chunks })
    }

    /// Ingest every supported file (`*.pdf`, `*.md`) under a directory.
    ///
    /// Files are visited in name order. A failing file is logged and the
    /// sweep continues; a single bad source never aborts the batch.
    pub async fn ingest_all(&self, directory: &Path) -> Result<IngestSummary> {
        let mut entries: Vec<_> = std::fs::read_dir(directory)
            .map_err(|e| crate::error::RagError::Extraction {
                path: directory.display().to_string(),
                message: e.to_string(),
            })?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        entries.sort();

        let mut summary = IngestSummary::default();
        for path in entries {
            let Some(extractor) = extractor_for(&path) else {
                continue;
            };
            let identity = DocumentIdentity::Filepath(path.display().to_string());

            match self.ingest_file(identity, &path, extractor).await {
                Ok(IngestOutcome::Ingested { .. }) => summary.ingested += 1,
                Ok(IngestOutcome::AlreadyProcessed) => summary.skipped += 1,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to ingest file");
                    summary.failed += 1;
                }
            }
        }

        if summary.failed > 0 {
            warn!(?summary, "ingest sweep finished with failures");
        } else {
            info!(?summary, "ingest sweep finished");
        }
        Ok(summary)
    }
}

/// Pick the extractor for a path by extension; `None` means unsupported.
fn extractor_for(path: &Path) -> Option<&'static dyn TextExtractor> {
    static PLAIN: PlainTextExtractor = PlainTextExtractor;
    #[cfg(feature = "pdf")]
    static PDF: PdfTextExtractor = PdfTextExtractor;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("md") => Some(&PLAIN),
        #[cfg(feature = "pdf")]
        Some("pdf") => Some(&PDF),
        _ => None,
    }
}
