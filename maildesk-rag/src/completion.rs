//! Completion provider trait for generating answer text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates a completion from a system/user message pair.
///
/// `max_tokens` bounds the length of the generated output; it is passed to
/// the backend rather than enforced by string truncation, so answers end at
/// a token boundary instead of mid-word.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the given system instruction and user message.
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
}
