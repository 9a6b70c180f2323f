//! The assistant facade a mail runner drives per incoming message.
//!
//! Message transport (IMAP/SMTP), attachment decoding, and reply templating
//! live outside this crate; the facade consumes already-extracted bodies
//! and question tables and produces the pieces a reply template needs.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use maildesk_rag::{Answerer, DocumentIngestor, IngestSummary};

use crate::batch::{BatchAnswerer, TableReport};
use crate::error::Result;
use crate::table::QuestionTable;

/// Reason reported for attachments that are not spreadsheets.
pub const UNSUPPORTED_ATTACHMENT_REASON: &str =
    "Unsupported file format. Only .xlsx and .xls files are supported";

/// `true` when an attachment filename looks like a supported spreadsheet.
pub fn is_supported_spreadsheet(filename: &str) -> bool {
    filename.ends_with(".xlsx") || filename.ends_with(".xls")
}

/// A question table extracted from a named attachment.
#[derive(Debug, Clone)]
pub struct NamedTable {
    /// The attachment's filename.
    pub filename: String,
    /// The parsed question table.
    pub table: QuestionTable,
}

/// An attachment the transport layer could not hand over as a table.
#[derive(Debug, Clone)]
pub struct SkippedAttachment {
    /// The attachment's filename.
    pub filename: String,
    /// Why it was skipped (e.g. [`UNSUPPORTED_ATTACHMENT_REASON`]).
    pub reason: String,
}

/// What happened to one message's attachments, shaped for the reply
/// template.
#[derive(Debug, Clone)]
pub struct AttachmentReport {
    /// Per-file summary lines, one `- ...` bullet per attachment.
    pub summary: String,
    /// Successfully processed tables, ready to be re-serialized and sent
    /// back, in input order.
    pub processed: Vec<(String, QuestionTable)>,
    /// Total attachments seen (tables plus skipped).
    pub attachments: usize,
    /// Tables processed successfully.
    pub processed_count: usize,
    /// Tables that could not be processed.
    pub failed: usize,
    /// Attachments skipped before processing.
    pub skipped: usize,
}

/// Ties the retrieval core together for the mail runner: startup ingestion,
/// per-body answering, and attachment-table fan-out.
pub struct MailAssistant {
    ingestor: DocumentIngestor,
    answerer: Arc<dyn Answerer>,
    batch: BatchAnswerer,
}

impl MailAssistant {
    /// Create an assistant. `display_similarity` gates which batch answers
    /// are shown (see [`BatchAnswerer`]).
    pub fn new(
        ingestor: DocumentIngestor,
        answerer: Arc<dyn Answerer>,
        display_similarity: f32,
    ) -> Self {
        let batch = BatchAnswerer::new(answerer.clone(), display_similarity);
        Self { ingestor, answerer, batch }
    }

    /// Populate the corpus from a document directory. Idempotent; called
    /// once at startup and safe to re-run after a crash.
    pub async fn ingest_startup(&self, docs_dir: &Path) -> Result<IngestSummary> {
        Ok(self.ingestor.ingest_all(docs_dir).await?)
    }

    /// Answer an email body.
    ///
    /// Returns `None` for a blank body, and also on a hard pipeline
    /// failure: sending no reply beats sending a malformed one, and the
    /// failure is logged.
    pub async fn answer_body(&self, body: &str) -> Option<String> {
        if body.trim().is_empty() {
            return None;
        }
        match self.answerer.answer(body).await {
            Ok(response) => Some(response.text),
            Err(e) => {
                error!(error = %e, "failed to answer message body, sending no reply");
                None
            }
        }
    }

    /// Process every question table from one message's attachments and
    /// build the per-file summary for the reply.
    pub async fn process_attachment_tables(
        &self,
        tables: Vec<NamedTable>,
        skipped: Vec<SkippedAttachment>,
    ) -> AttachmentReport {
        if tables.is_empty() && skipped.is_empty() {
            return AttachmentReport {
                summary: "No attachments found.".to_string(),
                processed: Vec::new(),
                attachments: 0,
                processed_count: 0,
                failed: 0,
                skipped: 0,
            };
        }

        let attachments = tables.len() + skipped.len();
        let table_count = tables.len();
        let mut lines: Vec<String> = skipped
            .iter()
            .map(|s| format!("File '{}' was skipped: {}", s.filename, s.reason))
            .collect();

        let mut processed = Vec::new();
        for NamedTable { filename, table } in tables {
            let TableReport { table: result, message } = self.batch.process_table(&table).await;
            match result {
                Some(extended) => {
                    lines.push(format!("File '{filename}' processed successfully: {message}"));
                    processed.push((filename, extended));
                }
                None => {
                    lines.push(format!("File '{filename}' could not be processed: {message}"));
                }
            }
        }

        let processed_count = processed.len();
        info!(attachments, processed_count, skipped = skipped.len(), "processed attachments");

        AttachmentReport {
            summary: lines.iter().map(|line| format!("- {line}")).collect::<Vec<_>>().join("\n"),
            processed,
            attachments,
            processed_count,
            failed: table_count - processed_count,
            skipped: skipped.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_extensions_are_recognized() {
        assert!(is_supported_spreadsheet("questions.xlsx"));
        assert!(is_supported_spreadsheet("legacy.xls"));
        assert!(!is_supported_spreadsheet("notes.pdf"));
        assert!(!is_supported_spreadsheet("data.csv"));
    }
}
