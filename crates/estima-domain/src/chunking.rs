//! Recursive text chunking with overlap
//!
//! Text is first broken into atomic pieces no longer than the chunk budget,
//! preferring paragraph breaks, then line breaks, then spaces, and cutting at
//! arbitrary character positions only as a last resort. Pieces are then merged
//! greedily into chunks, each new chunk re-using trailing pieces of the previous
//! one up to the configured overlap.
//!
//! Chunks are contiguous slices of the source text and always carry their byte
//! offset, so dropping the overlapping prefix of each chunk and concatenating
//! reproduces the input exactly. Sizes are measured in characters.

use crate::document::{Chunk, Document};
use std::ops::Range;

/// Split points in priority order; the character level follows the last one
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// An atomic span of text that fits the chunk budget
#[derive(Debug, Clone)]
struct Piece {
    span: Range<usize>,
    chars: usize,
}

/// Splits document text into ordered, overlapping chunks
///
/// # Examples
///
/// ```
/// use estima_domain::TextChunker;
///
/// let chunker = TextChunker::new(12, 0).unwrap();
/// let chunks = chunker.split_text("Para one.\n\nPara two.");
/// assert_eq!(chunks, vec!["Para one.\n\n", "Para two."]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker
    ///
    /// # Errors
    /// Returns error if `max_chunk_size` is zero or `overlap` is not smaller
    /// than `max_chunk_size`
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self, String> {
        if max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if overlap >= max_chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than max_chunk_size ({})",
                overlap, max_chunk_size
            ));
        }
        Ok(Self {
            max_chunk_size,
            overlap,
        })
    }

    /// Maximum chunk length in characters
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Maximum overlap between consecutive chunks in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Byte ranges of the chunks of `text`, in reading order
    ///
    /// Blank input yields no chunks.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.split_recursive(text, 0..text.len(), 0, &mut pieces);
        self.merge(&pieces)
    }

    /// Chunk texts of `text`, in reading order
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans(text).into_iter().map(|span| &text[span]).collect()
    }

    /// Chunk a document, attaching its identity and sequence indices
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text();
        self.spans(text)
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk {
                document_id: document.id().to_string(),
                index,
                start: span.start,
                text: text[span].to_string(),
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, span: Range<usize>, level: usize, out: &mut Vec<Piece>) {
        let chars = text[span.clone()].chars().count();
        if chars <= self.max_chunk_size {
            out.push(Piece { span, chars });
            return;
        }

        let Some(separator) = SEPARATORS.get(level) else {
            self.split_by_chars(text, span, out);
            return;
        };

        let parts = split_keeping_separator(text, span.clone(), separator);
        if parts.len() == 1 {
            self.split_recursive(text, span, level + 1, out);
            return;
        }

        for part in parts {
            self.split_recursive(text, part, level + 1, out);
        }
    }

    /// Last resort: fixed windows of `max_chunk_size` characters
    fn split_by_chars(&self, text: &str, span: Range<usize>, out: &mut Vec<Piece>) {
        let slice = &text[span.clone()];
        let mut start = 0;
        let mut count = 0;

        for (idx, _) in slice.char_indices() {
            if count == self.max_chunk_size {
                out.push(Piece {
                    span: span.start + start..span.start + idx,
                    chars: count,
                });
                start = idx;
                count = 0;
            }
            count += 1;
        }

        if count > 0 {
            out.push(Piece {
                span: span.start + start..span.end,
                chars: count,
            });
        }
    }

    /// Greedily merge pieces into chunks, carrying up to `overlap` characters
    fn merge(&self, pieces: &[Piece]) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut first = 0;
        let mut total = 0;

        for (i, piece) in pieces.iter().enumerate() {
            if i > first && total + piece.chars > self.max_chunk_size {
                chunks.push(pieces[first].span.start..pieces[i - 1].span.end);

                while first < i
                    && (total > self.overlap || total + piece.chars > self.max_chunk_size)
                {
                    total -= pieces[first].chars;
                    first += 1;
                }
            }
            total += piece.chars;
        }

        if let Some(last) = pieces.last() {
            chunks.push(pieces[first].span.start..last.span.end);
        }

        chunks
    }
}

/// Split `span` after every occurrence of `separator`, keeping the separator
/// at the end of the preceding part so parts stay contiguous
fn split_keeping_separator(text: &str, span: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let slice = &text[span.clone()];
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, matched) in slice.match_indices(separator) {
        let end = idx + matched.len();
        parts.push(span.start + start..span.start + end);
        start = end;
    }

    if start < slice.len() {
        parts.push(span.start + start..span.end);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Rebuild the source by dropping the overlapping prefix of each chunk
    fn reconstruct(text: &str, spans: &[Range<usize>]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for span in spans {
            assert!(span.start <= covered, "gap before chunk at {}", span.start);
            out.push_str(&text[covered.max(span.start)..span.end]);
            covered = span.end;
        }
        out
    }

    #[test]
    fn test_invalid_config() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 200).is_err());
        assert!(TextChunker::new(1000, 200).is_ok());
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert!(chunker.spans("").is_empty());
        assert!(chunker.spans("  \n\n ").is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let text = "Short text here.";
        assert_eq!(chunker.split_text(text), vec![text]);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunker = TextChunker::new(12, 0).unwrap();
        let chunks = chunker.split_text("Para one.\n\nPara two.");
        assert_eq!(chunks, vec!["Para one.\n\n", "Para two."]);
    }

    #[test]
    fn test_falls_back_to_line_breaks() {
        let chunker = TextChunker::new(10, 0).unwrap();
        let text = "line one\nline two\nline three";
        let chunks = chunker.split_text(text);
        assert_eq!(chunks, vec!["line one\n", "line two\n", "line three"]);
    }

    #[test]
    fn test_overlap_between_chunks() {
        let chunker = TextChunker::new(10, 4).unwrap();
        let chunks = chunker.split_text("one two three four five six");
        assert_eq!(chunks, vec!["one two ", "two three ", "four five ", "six"]);
    }

    #[test]
    fn test_unbroken_run_cut_by_characters() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let text = "a".repeat(25);
        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn test_multibyte_characters_not_split() {
        let chunker = TextChunker::new(3, 0).unwrap();
        let text = "≤≤≤≤≤≤≤";
        let chunks = chunker.split_text(text);
        assert_eq!(chunks, vec!["≤≤≤", "≤≤≤", "≤"]);
    }

    #[test]
    fn test_chunk_document_metadata() {
        let chunker = TextChunker::new(12, 0).unwrap();
        let doc = Document::new("UC_2024.txt", "Para one.\n\nPara two.");
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].document_id, "UC_2024.txt");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].start, 11);
        assert_eq!(chunks[1].text, "Para two.");
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_source(
            text in "[a-z \n]{0,400}",
            max in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % max;
            let chunker = TextChunker::new(max, overlap).unwrap();
            let spans = chunker.spans(&text);
            if text.trim().is_empty() {
                prop_assert!(spans.is_empty());
            } else {
                prop_assert_eq!(reconstruct(&text, &spans), text);
            }
        }

        #[test]
        fn prop_chunks_respect_size_bound(
            text in "\\PC{0,300}",
            max in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % max;
            let chunker = TextChunker::new(max, overlap).unwrap();
            for chunk in chunker.split_text(&text) {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.chars().count() <= max);
            }
        }

        #[test]
        fn prop_chunk_starts_strictly_increase(
            text in "[a-z \n]{1,300}",
            max in 2usize..40,
        ) {
            let chunker = TextChunker::new(max, max / 2).unwrap();
            let spans = chunker.spans(&text);
            for pair in spans.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
                prop_assert!(pair[1].start <= pair[0].end);
            }
        }
    }
}
