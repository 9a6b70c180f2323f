//! Tabular question input extracted from spreadsheet attachments.
//!
//! Cell parsing/serialization belongs to the transport layer; this module
//! only deals with the already-parsed grid of optional cell values.

use serde::{Deserialize, Serialize};

/// Header of the appended answer column.
pub const ANSWERS_HEADER: &str = "Answers";

/// Header of the appended score column.
pub const SIMILARITY_HEADER: &str = "Similarity Score";

/// A table of questions: one row per question, cells in column order.
///
/// An empty cell is `None`. The question of a row is the newline-join of
/// its non-empty cells, mirroring how spreadsheet rows read top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTable {
    /// Column headers, in order.
    pub headers: Vec<String>,
    /// Rows of optional cell values, in original order.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QuestionTable {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The question text of one row: non-empty cells joined by newlines,
    /// in column order. Returns an empty string for an all-empty row.
    pub fn row_question(row: &[Option<String>]) -> String {
        row.iter()
            .filter_map(|cell| cell.as_deref())
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A copy of this table with `Answers` and `Similarity Score` columns
    /// appended. `answers` and `scores` must have one entry per row.
    pub fn with_results(&self, answers: Vec<String>, scores: Vec<String>) -> QuestionTable {
        debug_assert_eq!(answers.len(), self.rows.len());
        debug_assert_eq!(scores.len(), self.rows.len());

        let mut headers = self.headers.clone();
        headers.push(ANSWERS_HEADER.to_string());
        headers.push(SIMILARITY_HEADER.to_string());

        let rows = self
            .rows
            .iter()
            .zip(answers.into_iter().zip(scores))
            .map(|(row, (answer, score))| {
                let mut row = row.clone();
                row.push(Some(answer));
                row.push(Some(score));
                row
            })
            .collect();

        QuestionTable { headers, rows }
    }
}
