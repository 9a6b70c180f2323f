//! # maildesk-rag
//!
//! Retrieval core for the maildesk email assistant: document ingestion,
//! vector storage, and a similarity-gated answer engine.
//!
//! ## Overview
//!
//! Ingestion extracts text from PDF/Markdown sources, splits it into
//! overlapping chunks, embeds each chunk, and stores it in a
//! [`VectorStore`] keyed by the owning document's identity (path or URL).
//! At query time the [`AnswerEngine`] embeds the question, retrieves the
//! closest chunks, applies the admission and context thresholds, and asks
//! the completion provider for a bounded answer, or declines.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use maildesk_rag::{
//!     AnswerEngine, Answerer, DocumentIngestor, PgVectorStore, RagConfig,
//!     openai::{OpenAIChatProvider, OpenAIEmbeddingProvider},
//! };
//!
//! let embedder = Arc::new(OpenAIEmbeddingProvider::from_env()?);
//! let store = Arc::new(PgVectorStore::connect(&database_url, embedder.dimensions()).await?);
//! store.migrate().await?;
//!
//! let config = RagConfig::builder().min_similarity(0.2).context_similarity(0.6).build()?;
//! let ingestor = DocumentIngestor::new(store.clone(), embedder.clone(), &config);
//! ingestor.ingest_all(Path::new("data/docs")).await?;
//!
//! let completion = Arc::new(OpenAIChatProvider::from_env()?);
//! let engine = AnswerEngine::new(store, embedder, completion, config);
//! let response = engine.answer("What is our refund policy?").await?;
//! ```
//!
//! ## Backends
//!
//! - [`PgVectorStore`]: PostgreSQL + pgvector (`pgvector` feature, default)
//! - [`InMemoryVectorStore`]: for tests and local development
//!
//! Provider implementations for the OpenAI API live in [`openai`]
//! (`openai` feature, default); deterministic test doubles live in
//! [`mock`].

pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod inmemory;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
pub mod store;

pub use chunking::TextChunker;
pub use completion::CompletionProvider;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, DocumentIdentity, DocumentMatch, RagResponse, SourceDocument};
pub use embedding::EmbeddingProvider;
pub use engine::{AnswerEngine, Answerer, LOW_CONFIDENCE_MESSAGE, NO_MATCH_MESSAGE};
pub use error::{RagError, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use ingest::{DocumentIngestor, IngestOutcome, IngestSummary};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
pub use store::VectorStore;

#[cfg(feature = "pdf")]
pub use extract::PdfTextExtractor;
