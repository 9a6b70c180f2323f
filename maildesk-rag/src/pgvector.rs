//! pgvector (PostgreSQL) vector store backend.
//!
//! Provides [`PgVectorStore`] which implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the
//! [pgvector](https://github.com/pgvector/pgvector) PostgreSQL extension.
//!
//! # Prerequisites
//!
//! - PostgreSQL with the `pgvector` extension installed; [`migrate`]
//!   creates the extension and both tables.
//!
//! # Schema
//!
//! `documents` holds one row per ingested identity (`filepath` and `url`
//! each carry a UNIQUE constraint); `chunks` holds the embedded text with a
//! foreign key to its document. Similarity is computed at query time as
//! `1 - (embedding <=> query)`; no scores are precomputed or cached.
//!
//! [`migrate`]: PgVectorStore::migrate

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::document::{Chunk, DocumentIdentity, DocumentMatch, SourceDocument};
use crate::error::{RagError, Result};
use crate::store::VectorStore;

/// A [`VectorStore`] backed by PostgreSQL with the pgvector extension.
///
/// The embedding dimension is fixed when the store is constructed and baked
/// into the `chunks.embedding` column type; inserts are validated against it
/// before touching the database.
pub struct PgVectorStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgVectorStore {
    /// Connect to the given database URL.
    pub async fn connect(database_url: &str, dimensions: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        Ok(Self { pool, dimensions })
    }

    /// Create a store from an existing connection pool.
    pub fn from_pool(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    /// Create the pgvector extension and the schema if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (\
                id BIGSERIAL PRIMARY KEY, \
                filepath TEXT UNIQUE, \
                url TEXT UNIQUE, \
                processed BOOLEAN NOT NULL DEFAULT FALSE, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                CHECK (filepath IS NOT NULL OR url IS NOT NULL)\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let create_chunks = format!(
            "CREATE TABLE IF NOT EXISTS chunks (\
                id BIGSERIAL PRIMARY KEY, \
                text TEXT NOT NULL, \
                embedding vector({}) NOT NULL, \
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                document_id BIGINT NOT NULL REFERENCES documents(id) ON DELETE CASCADE, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
            )",
            self.dimensions
        );
        sqlx::query(&create_chunks).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(dimensions = self.dimensions, "pgvector schema ready");
        Ok(())
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::Store { backend: "pgvector".to_string(), message: e.to_string() }
    }

    fn identity_column(identity: &DocumentIdentity) -> &'static str {
        match identity {
            DocumentIdentity::Filepath(_) => "filepath",
            DocumentIdentity::Url(_) => "url",
        }
    }

    /// pgvector expects vectors as a string like `[1.0,2.0,3.0]`.
    fn encode_vector(embedding: &[f32]) -> String {
        format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
    }

    fn document_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<SourceDocument> {
        Ok(SourceDocument {
            id: row.try_get("id")?,
            filepath: row.try_get("filepath")?,
            url: row.try_get("url")?,
            processed: row.try_get("processed")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn metadata_from_value(value: serde_json::Value) -> HashMap<String, String> {
        value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| {
                        let rendered = match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), rendered)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn find_document(&self, identity: &DocumentIdentity) -> Result<Option<SourceDocument>> {
        let column = Self::identity_column(identity);
        let sql = format!(
            "SELECT id, filepath, url, processed, created_at, updated_at \
             FROM documents WHERE {column} = $1"
        );

        let row = sqlx::query(&sql)
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;

        row.map(|row| Self::document_from_row(&row)).transpose().map_err(Self::map_err)
    }

    async fn create_document(&self, identity: &DocumentIdentity) -> Result<SourceDocument> {
        let column = Self::identity_column(identity);

        // Upsert-or-skip under the identity's unique constraint: two racing
        // ingestors converge on the same row.
        let insert_sql = format!(
            "INSERT INTO documents ({column}) VALUES ($1) \
             ON CONFLICT ({column}) DO NOTHING \
             RETURNING id, filepath, url, processed, created_at, updated_at"
        );
        let inserted = sqlx::query(&insert_sql)
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;

        if let Some(row) = inserted {
            debug!(identity = identity.as_str(), "registered document");
            return Self::document_from_row(&row).map_err(Self::map_err);
        }

        self.find_document(identity).await?.ok_or_else(|| RagError::Store {
            backend: "pgvector".to_string(),
            message: format!("document '{}' vanished during create-or-get", identity.as_str()),
        })
    }

    async fn mark_processed(&self, document_id: i64) -> Result<()> {
        let updated =
            sqlx::query("UPDATE documents SET processed = TRUE, updated_at = now() WHERE id = $1")
                .bind(document_id)
                .execute(&self.pool)
                .await
                .map_err(Self::map_err)?;

        if updated.rows_affected() == 0 {
            return Err(RagError::Store {
                backend: "pgvector".to_string(),
                message: format!("unknown document id {document_id}"),
            });
        }
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.len() != self.dimensions {
            return Err(RagError::Store {
                backend: "pgvector".to_string(),
                message: format!(
                    "embedding dimension {} does not match store dimension {}",
                    chunk.embedding.len(),
                    self.dimensions
                ),
            });
        }

        let metadata_json =
            serde_json::to_value(&chunk.metadata).unwrap_or_else(|_| serde_json::json!({}));

        sqlx::query(
            "INSERT INTO chunks (text, embedding, metadata, document_id) \
             VALUES ($1, $2::vector, $3, $4)",
        )
        .bind(&chunk.text)
        .bind(Self::encode_vector(&chunk.embedding))
        .bind(metadata_json)
        .bind(chunk.document_id)
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<DocumentMatch>> {
        // Cosine distance operator: <=>. Similarity = 1 - distance, computed
        // by the engine at query time. Ties break on chunk id, which is
        // insertion order under BIGSERIAL.
        let rows = sqlx::query(
            "SELECT c.text, c.metadata, 1 - (c.embedding <=> $1::vector) AS similarity, \
                    d.id AS document_id, d.filepath, d.url, d.processed, \
                    d.created_at, d.updated_at \
             FROM chunks c \
             JOIN documents d ON d.id = c.document_id \
             WHERE 1 - (c.embedding <=> $1::vector) >= $2 \
             ORDER BY c.embedding <=> $1::vector ASC, c.id ASC \
             LIMIT $3",
        )
        .bind(Self::encode_vector(embedding))
        .bind(f64::from(min_similarity))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let matches = rows
            .iter()
            .map(|row| -> sqlx::Result<DocumentMatch> {
                let similarity: f64 = row.try_get("similarity")?;
                let metadata_value: serde_json::Value = row.try_get("metadata")?;
                Ok(DocumentMatch {
                    text: row.try_get("text")?,
                    similarity: similarity as f32,
                    metadata: Self::metadata_from_value(metadata_value),
                    document: SourceDocument {
                        id: row.try_get("document_id")?,
                        filepath: row.try_get("filepath")?,
                        url: row.try_get("url")?,
                        processed: row.try_get("processed")?,
                        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
                    },
                })
            })
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(Self::map_err)?;

        debug!(count = matches.len(), "pgvector query completed");
        Ok(matches)
    }

    async fn delete_by_text(&self, text: &str) -> Result<()> {
        // Subselect keeps the delete to at most one row even when the same
        // text was stored twice (at-least-once ingestion retries).
        sqlx::query(
            "DELETE FROM chunks WHERE id = \
             (SELECT id FROM chunks WHERE text = $1 ORDER BY id ASC LIMIT 1)",
        )
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;
        Ok(())
    }

    async fn count_chunks(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        Ok(count as usize)
    }
}
