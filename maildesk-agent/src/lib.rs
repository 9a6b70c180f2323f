//! # maildesk-agent
//!
//! Mail-facing layer for the maildesk assistant.
//!
//! A mail runner owns transport (polling a mailbox, decoding attachments,
//! templating and sending the reply) and drives this crate per message:
//!
//! - [`MailAssistant::ingest_startup`] populates the corpus once.
//! - [`MailAssistant::answer_body`] answers the message body, staying
//!   silent on blank bodies and hard failures.
//! - [`MailAssistant::process_attachment_tables`] runs the
//!   [`BatchAnswerer`] over every spreadsheet-derived [`QuestionTable`]
//!   and assembles the per-file summary for the reply template.
//!
//! The batch path appends two columns per table (the generated answers
//! and their similarity scores) and re-gates each row against a display
//! threshold independent from the engine's internal floors.

pub mod assistant;
pub mod batch;
pub mod error;
pub mod table;

pub use assistant::{
    AttachmentReport, MailAssistant, NamedTable, SkippedAttachment,
    UNSUPPORTED_ATTACHMENT_REASON, is_supported_spreadsheet,
};
pub use batch::{BatchAnswerer, NOT_ENOUGH_INFORMATION, SCORE_NOT_AVAILABLE, TableReport};
pub use error::{AgentError, Result};
pub use table::{ANSWERS_HEADER, QuestionTable, SIMILARITY_HEADER};
