//! Persistent per-document vector index
//!
//! Chunks every document, embeds each chunk and stores the vectors in a
//! SQLite namespace. Search is restricted to a single document and returns
//! the k most similar chunks.

use crate::config::{IndexConfig, StalePolicy};
use crate::embedding::{blob_to_vector, cosine_similarity, fingerprint, vector_to_blob};
use crate::StoreError;
use estima_domain::{Chunk, Document, EmbeddingProvider, TextChunker};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Default number of chunks retrieved per query
pub const DEFAULT_TOP_K: usize = 5;

/// File name of the namespace database inside the persist directory
pub const INDEX_FILE: &str = "index.sqlite3";

/// A chunk returned by [`VectorIndex::search`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Document the chunk belongs to
    pub document_id: String,
    /// Position of the chunk within its document
    pub chunk_index: usize,
    /// Chunk text
    pub text: String,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Result of [`VectorIndex::build`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Documents were chunked, embedded and stored
    Built {
        /// Documents indexed
        documents: usize,
        /// Chunks stored
        chunks: usize,
    },
    /// The namespace already held entries and was left untouched
    Reused {
        /// Chunks present in the namespace
        chunks: usize,
        /// Whether the namespace was built from different inputs
        stale: bool,
    },
}

/// Description of the build that produced a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Fingerprint of documents, chunking parameters and embedding model
    pub fingerprint: String,
    /// Embedding model used for the stored vectors
    pub embedding_model: String,
    /// Vector length
    pub dimension: usize,
    /// Chunk size used
    pub chunk_size: usize,
    /// Chunk overlap used
    pub chunk_overlap: usize,
    /// Documents indexed
    pub document_count: usize,
    /// Chunks stored
    pub chunk_count: usize,
    /// Unix timestamp of the build
    pub built_at: i64,
}

/// Vector index over document chunks
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use estima_domain::Document;
/// use estima_llm::MockEmbedder;
/// use estima_store::{BuildOutcome, IndexConfig, VectorIndex};
///
/// let index = VectorIndex::open(IndexConfig::at("./chroma_db"), Arc::new(MockEmbedder::new(64))).unwrap();
/// let docs = [Document::new("doc1", "We enrolled 248 patients.")];
/// match index.build(&docs).unwrap() {
///     BuildOutcome::Built { chunks, .. } => println!("indexed {chunks} chunks"),
///     BuildOutcome::Reused { chunks, .. } => println!("reusing {chunks} chunks"),
/// }
/// ```
pub struct VectorIndex<E> {
    embedder: Arc<E>,
    conn: Mutex<Connection>,
    chunker: TextChunker,
    on_stale: StalePolicy,
    location: PathBuf,
}

impl<E> VectorIndex<E>
where
    E: EmbeddingProvider,
    E::Error: Display,
{
    /// Open (or create) the namespace under `config.persist_dir`
    ///
    /// # Errors
    /// Invalid chunking parameters, an unwritable directory, or a database
    /// that cannot be opened
    pub fn open(config: IndexConfig, embedder: Arc<E>) -> Result<Self, StoreError> {
        let chunker = config.chunker()?;
        std::fs::create_dir_all(&config.persist_dir)?;
        let location = config.persist_dir.join(INDEX_FILE);

        let conn = Connection::open(&location)?;
        Self::with_connection(conn, chunker, config.on_stale, location, embedder)
    }

    /// Namespace held in memory only
    pub fn in_memory(config: IndexConfig, embedder: Arc<E>) -> Result<Self, StoreError> {
        let chunker = config.chunker()?;
        let conn = Connection::open_in_memory()?;
        Self::with_connection(
            conn,
            chunker,
            config.on_stale,
            PathBuf::from(":memory:"),
            embedder,
        )
    }

    fn with_connection(
        conn: Connection,
        chunker: TextChunker,
        on_stale: StalePolicy,
        location: PathBuf,
        embedder: Arc<E>,
    ) -> Result<Self, StoreError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        debug!(path = %location.display(), "Opened vector namespace");
        Ok(Self {
            embedder,
            conn: Mutex::new(conn),
            chunker,
            on_stale,
            location,
        })
    }

    /// Location of the namespace database
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The embedding provider backing this index
    pub fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }

    /// Number of stored chunks
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the namespace holds no chunks
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Ids of all indexed documents, sorted
    pub fn document_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT document_id FROM chunks ORDER BY document_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Manifest of the last successful build, if any
    pub fn manifest(&self) -> Result<Option<Manifest>, StoreError> {
        let conn = self.lock()?;
        let manifest = conn
            .query_row(
                "SELECT fingerprint, embedding_model, dimension, chunk_size, chunk_overlap,
                        document_count, chunk_count, built_at
                 FROM manifest WHERE id = 1",
                [],
                |row| {
                    Ok(Manifest {
                        fingerprint: row.get(0)?,
                        embedding_model: row.get(1)?,
                        dimension: row.get::<_, i64>(2)? as usize,
                        chunk_size: row.get::<_, i64>(3)? as usize,
                        chunk_overlap: row.get::<_, i64>(4)? as usize,
                        document_count: row.get::<_, i64>(5)? as usize,
                        chunk_count: row.get::<_, i64>(6)? as usize,
                        built_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(manifest)
    }

    /// Whether the stored namespace was built from different inputs
    pub fn is_stale(&self, documents: &[Document]) -> Result<bool, StoreError> {
        let expected = fingerprint(documents, &self.chunker, self.embedder.model_id());
        Ok(self
            .manifest()?
            .is_none_or(|manifest| manifest.fingerprint != expected))
    }

    /// Index `documents`, or reuse the namespace if it already holds entries
    ///
    /// All chunks are embedded before anything is written, and the write is
    /// a single transaction: a failed build leaves the namespace as it was.
    ///
    /// # Errors
    /// - `StoreError::Provider` if any embedding call fails
    /// - `StoreError::StaleNamespace` if the namespace is stale and the
    ///   policy is `fail`
    pub fn build(&self, documents: &[Document]) -> Result<BuildOutcome, StoreError> {
        let existing = self.len()?;
        if existing > 0 {
            let stale = self.is_stale(documents)?;
            if !stale {
                info!(chunks = existing, path = %self.location.display(), "Reusing vector namespace");
                return Ok(BuildOutcome::Reused {
                    chunks: existing,
                    stale: false,
                });
            }

            match self.on_stale {
                StalePolicy::Warn => {
                    warn!(
                        path = %self.location.display(),
                        "Vector namespace was built from different documents or settings; reusing it anyway"
                    );
                    return Ok(BuildOutcome::Reused {
                        chunks: existing,
                        stale: true,
                    });
                }
                StalePolicy::Fail => {
                    return Err(StoreError::StaleNamespace(
                        self.location.display().to_string(),
                    ))
                }
                StalePolicy::Rebuild => {
                    warn!(path = %self.location.display(), "Rebuilding stale vector namespace");
                }
            }
        }

        let rows = self.embed_documents(documents)?;
        let dimension = rows.first().map(|(_, v)| v.len()).unwrap_or(0);
        let manifest = Manifest {
            fingerprint: fingerprint(documents, &self.chunker, self.embedder.model_id()),
            embedding_model: self.embedder.model_id().to_string(),
            dimension,
            chunk_size: self.chunker.max_chunk_size(),
            chunk_overlap: self.chunker.overlap(),
            document_count: documents.len(),
            chunk_count: rows.len(),
            built_at: unix_now(),
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM manifest", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (document_id, chunk_index, start_offset, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (chunk, vector) in &rows {
                stmt.execute(params![
                    chunk.document_id,
                    chunk.index as i64,
                    chunk.start as i64,
                    chunk.text,
                    vector_to_blob(vector),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO manifest (id, fingerprint, embedding_model, dimension, chunk_size,
                                   chunk_overlap, document_count, chunk_count, built_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                manifest.fingerprint,
                manifest.embedding_model,
                manifest.dimension as i64,
                manifest.chunk_size as i64,
                manifest.chunk_overlap as i64,
                manifest.document_count as i64,
                manifest.chunk_count as i64,
                manifest.built_at,
            ],
        )?;
        tx.commit()?;

        info!(
            documents = documents.len(),
            chunks = rows.len(),
            dimension,
            path = %self.location.display(),
            "Built vector namespace"
        );
        Ok(BuildOutcome::Built {
            documents: documents.len(),
            chunks: rows.len(),
        })
    }

    /// The `k` chunks of `document_id` most similar to `query`
    ///
    /// Ordered by descending score; equal scores keep chunk order. An
    /// unknown document yields an empty result.
    pub fn search(
        &self,
        query: &str,
        document_id: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.load_document(document_id)?;
        if candidates.is_empty() {
            debug!(document = document_id, "No indexed chunks for document");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_query(query)
            .map_err(|e| StoreError::Provider(e.to_string()))?;

        let mut scored = Vec::with_capacity(candidates.len());
        for (chunk_index, text, vector) in candidates {
            let score = cosine_similarity(&query_vector, &vector)?;
            scored.push(RetrievedChunk {
                document_id: document_id.to_string(),
                chunk_index,
                text,
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(k);

        debug!(
            document = document_id,
            returned = scored.len(),
            top_score = scored.first().map(|c| c.score),
            "Retrieved chunks"
        );
        Ok(scored)
    }

    fn embed_documents(&self, documents: &[Document]) -> Result<Vec<(Chunk, Vec<f32>)>, StoreError> {
        let mut rows = Vec::new();
        let mut dimension: Option<usize> = None;

        for document in documents {
            let chunks = self.chunker.chunk_document(document);
            debug!(document = document.id(), chunks = chunks.len(), "Chunked document");

            for chunk in chunks {
                let vector = self.embedder.embed(&chunk.text).map_err(|e| {
                    StoreError::Provider(format!(
                        "{} (document {}, chunk {})",
                        e, chunk.document_id, chunk.index
                    ))
                })?;

                match dimension {
                    None => dimension = Some(vector.len()),
                    Some(expected) if expected != vector.len() => {
                        return Err(StoreError::DimensionMismatch {
                            expected,
                            actual: vector.len(),
                        })
                    }
                    Some(_) => {}
                }
                rows.push((chunk, vector));
            }
        }

        Ok(rows)
    }

    fn load_document(&self, document_id: &str) -> Result<Vec<(usize, String, Vec<f32>)>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT chunk_index, text, embedding FROM chunks
             WHERE document_id = ?1 ORDER BY chunk_index",
        )?;
        let rows = stmt
            .query_map(params![document_id], |row| {
                Ok((
                    row.get::<_, i64>(0)? as usize,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(index, text, blob)| Ok((index, text, blob_to_vector(&blob)?)))
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estima_llm::MockEmbedder;

    fn index(dimension: usize) -> VectorIndex<MockEmbedder> {
        let config = IndexConfig {
            chunk_size: 40,
            chunk_overlap: 0,
            ..Default::default()
        };
        VectorIndex::in_memory(config, Arc::new(MockEmbedder::new(dimension))).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index = index(32);
        assert!(index.is_empty().unwrap());
        assert!(index.manifest().unwrap().is_none());
        assert!(index.search("anything", "doc1", 5).unwrap().is_empty());
    }

    #[test]
    fn test_build_writes_manifest() {
        let index = index(32);
        let docs = [Document::new(
            "doc1",
            "Sample size was 248 patients in total.\n\nMean age of all patients was 41 years.",
        )];

        let outcome = index.build(&docs).unwrap();
        assert_eq!(
            outcome,
            BuildOutcome::Built {
                documents: 1,
                chunks: 2
            }
        );

        let manifest = index.manifest().unwrap().unwrap();
        assert_eq!(manifest.chunk_count, 2);
        assert_eq!(manifest.dimension, 32);
        assert_eq!(manifest.embedding_model, "mock-bag-of-words");
        assert_eq!(manifest.chunk_size, 40);
        assert!(!index.is_stale(&docs).unwrap());
    }

    #[test]
    fn test_zero_k_returns_nothing() {
        let index = index(32);
        index.build(&[Document::new("doc1", "text")]).unwrap();
        assert!(index.search("text", "doc1", 0).unwrap().is_empty());
    }

    #[test]
    fn test_blank_document_contributes_no_chunks() {
        let index = index(32);
        let outcome = index
            .build(&[Document::new("blank", "  \n "), Document::new("doc", "words")])
            .unwrap();
        assert_eq!(
            outcome,
            BuildOutcome::Built {
                documents: 2,
                chunks: 1
            }
        );
        assert_eq!(index.document_ids().unwrap(), vec!["doc"]);
    }
}
