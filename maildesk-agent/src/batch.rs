//! Batch answering over question tables.
//!
//! The orchestrator runs the retrieval core once per row and then re-gates
//! each generated answer against a *display* threshold, independent from
//! the engine's internal admission floor. A row whose score misses the
//! display bar shows a fixed placeholder regardless of what the engine
//! produced. One extra completion call buys much simpler per-row logic.

use std::sync::Arc;

use tracing::{error, info};

use maildesk_rag::Answerer;

use crate::table::QuestionTable;

/// Placeholder shown for rows that are empty or fall below the display bar.
pub const NOT_ENOUGH_INFORMATION: &str = "Not enough information to answer this question.";

/// Score text for rows with no similarity at all.
pub const SCORE_NOT_AVAILABLE: &str = "N/A";

/// The outcome of processing one table: either the extended table with a
/// success message, or a descriptive failure message. Failures here are
/// values, not errors; one bad file must not abort its siblings.
#[derive(Debug, Clone)]
pub struct TableReport {
    /// The table with `Answers` and `Similarity Score` columns, when
    /// processing succeeded.
    pub table: Option<QuestionTable>,
    /// Human-readable summary of what happened.
    pub message: String,
}

impl TableReport {
    fn failed(message: impl Into<String>) -> Self {
        Self { table: None, message: message.into() }
    }
}

/// Applies an [`Answerer`] row-by-row over question tables.
pub struct BatchAnswerer {
    answerer: Arc<dyn Answerer>,
    display_similarity: f32,
}

impl BatchAnswerer {
    /// Create a batch answerer gating displayed answers at
    /// `display_similarity` (inclusive).
    pub fn new(answerer: Arc<dyn Answerer>, display_similarity: f32) -> Self {
        Self { answerer, display_similarity }
    }

    /// Answer every row of a table.
    ///
    /// Row order is preserved. Empty rows get the placeholder without an
    /// engine call; generated answers are shown only when the row's score
    /// clears the display threshold. A missing score renders as `"N/A"`.
    pub async fn process_table(&self, table: &QuestionTable) -> TableReport {
        if table.is_empty() {
            return TableReport::failed("table is empty");
        }

        info!(rows = table.len(), "processing question table");
        let mut answers = Vec::with_capacity(table.len());
        let mut scores = Vec::with_capacity(table.len());

        for row in &table.rows {
            let question = QuestionTable::row_question(row);
            if question.is_empty() {
                answers.push(NOT_ENOUGH_INFORMATION.to_string());
                scores.push(SCORE_NOT_AVAILABLE.to_string());
                continue;
            }

            let response = match self.answerer.answer(&question).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "failed to answer a row, dropping the table");
                    return TableReport::failed(format!("error processing questions: {e}"));
                }
            };

            let shown = match response.max_similarity {
                Some(score) if score >= self.display_similarity => response.text,
                _ => NOT_ENOUGH_INFORMATION.to_string(),
            };
            answers.push(shown);
            scores.push(format_score(response.max_similarity));
        }

        let message = format!("processed {} questions", table.len());
        TableReport { table: Some(table.with_results(answers, scores)), message }
    }
}

/// Render a similarity as a percentage with one decimal, or `"N/A"`.
fn format_score(score: Option<f32>) -> String {
    match score {
        Some(score) => format!("{:.1}%", score * 100.0),
        None => SCORE_NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_format_as_one_decimal_percentages() {
        assert_eq!(format_score(Some(0.85)), "85.0%");
        assert_eq!(format_score(Some(0.25)), "25.0%");
        assert_eq!(format_score(Some(0.333)), "33.3%");
        assert_eq!(format_score(Some(1.0)), "100.0%");
        assert_eq!(format_score(None), "N/A");
    }
}
