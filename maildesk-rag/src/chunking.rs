//! Deterministic paragraph-aware text chunking.
//!
//! The splitter prefers paragraph boundaries (blank lines), falls back to
//! sentence-ish boundaries (`[^,.;]+[,.;]?`) inside oversized paragraphs,
//! and hard-splits only pathological unbroken runs. Consecutive chunks
//! share a configurable character overlap so that statements spanning a
//! boundary stay retrievable.

use regex::Regex;

/// Sentence-ish boundary: a run without `, . ;` followed by at most one of them.
const SENTENCE_PATTERN: &str = "[^,.;]+[,.;]?";

/// A deterministic text splitter with a target size and overlap.
///
/// Both knobs come from [`RagConfig`](crate::config::RagConfig). The same
/// input always yields the same chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    sentence_re: Regex,
}

impl TextChunker {
    /// Create a chunker with the given target size and overlap (characters).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let sentence_re = Regex::new(SENTENCE_PATTERN).expect("sentence pattern is valid");
        Self { chunk_size, chunk_overlap, sentence_re }
    }

    /// Split text into chunks. Returns an empty `Vec` for blank input;
    /// every returned chunk is non-empty.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        // Pass 1: paragraph-sized segments; oversized paragraphs are broken
        // at sentence-ish boundaries first.
        let mut segments = Vec::new();
        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if paragraph.len() <= self.chunk_size {
                segments.push(paragraph.to_string());
            } else {
                segments.extend(self.split_paragraph(paragraph));
            }
        }

        // Pass 2: greedy merge toward the target size, carrying the overlap
        // tail of each emitted chunk into the next.
        self.merge(segments)
    }

    /// Break an oversized paragraph into segments no larger than the target,
    /// packing whole sentence-ish pieces together where they fit.
    fn split_paragraph(&self, paragraph: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();

        for piece in self.sentence_re.find_iter(paragraph) {
            let piece = piece.as_str().trim();
            if piece.is_empty() {
                continue;
            }

            if piece.len() > self.chunk_size {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                segments.extend(split_by_size(piece, self.chunk_size));
            } else if current.is_empty() {
                current = piece.to_string();
            } else if current.len() + 1 + piece.len() <= self.chunk_size {
                current.push(' ');
                current.push_str(piece);
            } else {
                segments.push(std::mem::replace(&mut current, piece.to_string()));
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    fn merge(&self, segments: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for segment in segments {
            if current.is_empty() {
                current = segment;
            } else if current.len() + 2 + segment.len() <= self.chunk_size {
                current.push_str("\n\n");
                current.push_str(&segment);
            } else {
                let tail = overlap_tail(&current, self.chunk_overlap).to_string();
                chunks.push(std::mem::take(&mut current));
                current = if tail.is_empty() { segment } else { format!("{tail}\n{segment}") };
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// The trailing `overlap` characters of `text`, adjusted to a char boundary.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    if text.len() <= overlap {
        return text;
    }
    let mut start = text.len() - overlap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Hard character split for runs with no usable boundary.
fn split_by_size(text: &str, chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        pieces.push(text[start..end].to_string());
        start = end;
    }
    pieces
}
