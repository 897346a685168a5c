//! Vector helpers for the index
//!
//! Embeddings are stored as little-endian `f32` blobs. Scoring is plain
//! cosine similarity.

use crate::StoreError;
use estima_domain::{Document, TextChunker};
use sha2::{Digest, Sha256};

/// Calculate cosine similarity between two embedding vectors
///
/// # Returns
///
/// Cosine similarity in range [-1, 1], where:
/// - 1.0 = identical direction
/// - 0.0 = orthogonal (or either vector is all zeros)
/// - -1.0 = opposite direction
///
/// # Errors
///
/// `StoreError::DimensionMismatch` if the vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, StoreError> {
    if a.len() != b.len() {
        return Err(StoreError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Encode a vector as a little-endian byte blob
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a blob written by [`vector_to_blob`]
pub fn blob_to_vector(blob: &[u8]) -> Result<Vec<f32>, StoreError> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::InvalidData(format!(
            "embedding blob of {} bytes is not a whole number of f32 values",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// SHA256 over everything that determines a namespace's contents
///
/// Covers the embedding model, the chunking parameters and every document's
/// id and text. Document order does not matter.
pub fn fingerprint(documents: &[Document], chunker: &TextChunker, model_id: &str) -> String {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by(|a, b| a.id().cmp(b.id()));

    let mut hasher = Sha256::new();
    update_field(&mut hasher, model_id.as_bytes());
    hasher.update((chunker.max_chunk_size() as u64).to_le_bytes());
    hasher.update((chunker.overlap() as u64).to_le_bytes());
    for document in sorted {
        update_field(&mut hasher, document.id().as_bytes());
        update_field(&mut hasher, document.text().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

// Length-prefixed so that ("ab", "c") and ("a", "bc") hash differently
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
