//! Error types for the `maildesk-agent` crate.

use thiserror::Error;

/// Errors that can occur in the mail-facing layer.
///
/// Batch-path validation problems (an empty table, an unsupported
/// attachment) are deliberately *not* errors: they are reported as
/// human-readable messages in the per-file summary instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// An error propagated from the retrieval core.
    #[error(transparent)]
    Rag(#[from] maildesk_rag::RagError),
}

/// A convenience result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
