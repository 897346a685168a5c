//! Documents and the chunks cut from them

/// A source document: full extracted text keyed by its filename
///
/// Documents are created once during ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    text: String,
}

impl Document {
    /// Create a document from its identity (filename) and full text
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Document identity (filename or path)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full document text
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A contiguous slice of a document, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Identity of the owning document
    pub document_id: String,

    /// Zero-based sequence index within the document
    pub index: usize,

    /// Byte offset of the chunk start in the document text
    pub start: usize,

    /// Chunk text
    pub text: String,
}

impl Chunk {
    /// Byte offset one past the chunk end in the document text
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Number of bytes shared with the previous chunk
    pub fn overlap_with(&self, previous: &Chunk) -> usize {
        previous.end().saturating_sub(self.start)
    }
}
