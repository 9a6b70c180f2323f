//! Batch orchestrator and assistant facade scenarios.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use maildesk_agent::{
    BatchAnswerer, MailAssistant, NamedTable, NOT_ENOUGH_INFORMATION, QuestionTable,
    SkippedAttachment, UNSUPPORTED_ATTACHMENT_REASON,
};
use maildesk_rag::mock::MockEmbedder;
use maildesk_rag::{
    Answerer, DocumentIngestor, InMemoryVectorStore, RagConfig, RagError, RagResponse,
};

/// An [`Answerer`] that replays a scripted queue of responses and counts
/// how often it was invoked.
struct ScriptedAnswerer {
    responses: Mutex<VecDeque<RagResponse>>,
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedAnswerer {
    fn new(responses: Vec<RagResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(VecDeque::new()), calls: AtomicUsize::new(0), fail: true })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Answerer for ScriptedAnswerer {
    async fn answer(&self, _question: &str) -> maildesk_rag::Result<RagResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagError::Completion {
                provider: "Scripted".into(),
                message: "simulated failure".into(),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted answerer ran out of responses"))
    }
}

fn response(text: &str, similarity: Option<f32>) -> RagResponse {
    RagResponse { text: text.to_string(), max_similarity: similarity, document_url: None }
}

fn cell(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn three_question_table() -> QuestionTable {
    QuestionTable::new(
        vec!["Question".to_string()],
        vec![
            vec![cell("What is the refund policy?")],
            vec![cell("What about shipping?")],
            vec![cell("Anything else?")],
        ],
    )
}

#[tokio::test]
async fn display_gating_and_score_formatting_per_row() {
    let answerer = ScriptedAnswerer::new(vec![
        response("Refunds within 30 days.", Some(0.85)),
        response("A generated but low-confidence answer.", Some(0.25)),
        response("Declined.", None),
    ]);
    let batch = BatchAnswerer::new(answerer.clone(), 0.5);

    let report = batch.process_table(&three_question_table()).await;
    let table = report.table.expect("table should process");

    let answers: Vec<&str> =
        table.rows.iter().map(|row| row[1].as_deref().unwrap()).collect();
    let scores: Vec<&str> =
        table.rows.iter().map(|row| row[2].as_deref().unwrap()).collect();

    assert_eq!(
        answers,
        vec!["Refunds within 30 days.", NOT_ENOUGH_INFORMATION, NOT_ENOUGH_INFORMATION]
    );
    assert_eq!(scores, vec!["85.0%", "25.0%", "N/A"]);
    assert_eq!(answerer.call_count(), 3);
    assert_eq!(report.message, "processed 3 questions");
}

#[tokio::test]
async fn score_exactly_at_display_threshold_is_shown() {
    let answerer = ScriptedAnswerer::new(vec![response("Borderline answer.", Some(0.5))]);
    let batch = BatchAnswerer::new(answerer, 0.5);

    let table =
        QuestionTable::new(vec!["Q".to_string()], vec![vec![cell("Borderline question?")]]);
    let report = batch.process_table(&table).await;

    let extended = report.table.unwrap();
    assert_eq!(extended.rows[0][1].as_deref(), Some("Borderline answer."));
    assert_eq!(extended.rows[0][2].as_deref(), Some("50.0%"));
}

#[tokio::test]
async fn empty_table_reports_a_message_not_an_error() {
    let answerer = ScriptedAnswerer::new(Vec::new());
    let batch = BatchAnswerer::new(answerer.clone(), 0.5);

    let report = batch.process_table(&QuestionTable::new(vec![], vec![])).await;

    assert!(report.table.is_none());
    assert_eq!(report.message, "table is empty");
    assert_eq!(answerer.call_count(), 0);
}

#[tokio::test]
async fn empty_rows_skip_the_engine_entirely() {
    let answerer = ScriptedAnswerer::new(vec![response("Real answer.", Some(0.9))]);
    let batch = BatchAnswerer::new(answerer.clone(), 0.5);

    let table = QuestionTable::new(
        vec!["A".to_string(), "B".to_string()],
        vec![
            vec![None, cell("  ")],
            vec![cell("A real question?"), None],
        ],
    );
    let report = batch.process_table(&table).await;
    let extended = report.table.unwrap();

    // Only the non-empty row reached the engine.
    assert_eq!(answerer.call_count(), 1);
    assert_eq!(extended.rows[0][2].as_deref(), Some(NOT_ENOUGH_INFORMATION));
    assert_eq!(extended.rows[0][3].as_deref(), Some("N/A"));
    assert_eq!(extended.rows[1][2].as_deref(), Some("Real answer."));
    assert_eq!(extended.rows[1][3].as_deref(), Some("90.0%"));
}

#[tokio::test]
async fn row_failure_drops_the_table_with_a_message() {
    let batch = BatchAnswerer::new(ScriptedAnswerer::failing(), 0.5);

    let report = batch.process_table(&three_question_table()).await;

    assert!(report.table.is_none());
    assert!(report.message.contains("error processing questions"), "{}", report.message);
}

// ── Assistant facade ───────────────────────────────────────────────

fn assistant_with(answerer: Arc<dyn Answerer>) -> MailAssistant {
    let config = RagConfig::default();
    let store = Arc::new(InMemoryVectorStore::new(4));
    let ingestor = DocumentIngestor::new(store, Arc::new(MockEmbedder::new(4)), &config);
    MailAssistant::new(ingestor, answerer, 0.5)
}

#[tokio::test]
async fn blank_body_gets_no_reply_and_no_engine_call() {
    let answerer = ScriptedAnswerer::new(Vec::new());
    let assistant = assistant_with(answerer.clone());

    assert_eq!(assistant.answer_body("").await, None);
    assert_eq!(assistant.answer_body("  \r\n  ").await, None);
    assert_eq!(answerer.call_count(), 0);
}

#[tokio::test]
async fn body_answer_uses_the_engine_response_text() {
    let answerer = ScriptedAnswerer::new(vec![response("Paris.", Some(0.9))]);
    let assistant = assistant_with(answerer);

    assert_eq!(assistant.answer_body("What is the capital of France?").await.as_deref(), Some("Paris."));
}

#[tokio::test]
async fn hard_failure_produces_no_reply() {
    let assistant = assistant_with(ScriptedAnswerer::failing());
    assert_eq!(assistant.answer_body("Any question.").await, None);
}

#[tokio::test]
async fn attachment_report_covers_processed_failed_and_skipped_files() {
    let answerer = ScriptedAnswerer::new(vec![response("Answer.", Some(0.9))]);
    let assistant = assistant_with(answerer);

    let good = NamedTable {
        filename: "questions.xlsx".to_string(),
        table: QuestionTable::new(vec!["Q".to_string()], vec![vec![cell("A question?")]]),
    };
    let empty = NamedTable {
        filename: "empty.xlsx".to_string(),
        table: QuestionTable::new(vec!["Q".to_string()], vec![]),
    };
    let skipped = SkippedAttachment {
        filename: "notes.pdf".to_string(),
        reason: UNSUPPORTED_ATTACHMENT_REASON.to_string(),
    };

    let report = assistant.process_attachment_tables(vec![good, empty], vec![skipped]).await;

    assert_eq!(report.attachments, 3);
    assert_eq!(report.processed_count, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed[0].0, "questions.xlsx");

    assert!(report.summary.contains("File 'notes.pdf' was skipped"));
    assert!(report.summary.contains("File 'questions.xlsx' processed successfully"));
    assert!(report.summary.contains("File 'empty.xlsx' could not be processed: table is empty"));
}

#[tokio::test]
async fn no_attachments_reports_the_fixed_line() {
    let assistant = assistant_with(ScriptedAnswerer::new(Vec::new()));
    let report = assistant.process_attachment_tables(Vec::new(), Vec::new()).await;
    assert_eq!(report.summary, "No attachments found.");
    assert_eq!(report.attachments, 0);
}

#[tokio::test]
async fn startup_ingest_sweeps_the_docs_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("faq.md"), "Refunds are accepted within 30 days.").unwrap();

    let assistant = assistant_with(ScriptedAnswerer::new(Vec::new()));
    let summary = assistant.ingest_startup(Path::new(dir.path())).await.unwrap();

    assert_eq!(summary.ingested, 1);
    assert_eq!(summary.failed, 0);

    // Idempotent: a second sweep skips the processed file.
    let summary = assistant.ingest_startup(dir.path()).await.unwrap();
    assert_eq!(summary.skipped, 1);
}
