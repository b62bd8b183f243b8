use tracing::debug;

use super::traits::{Embedder, EmbeddingError};
use crate::document::Document;

/// Documents per backend call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embed `docs` in batches of `batch_size`, returning one unit-length
/// `f64` vector per document, in order.
///
/// Zero vectors (e.g. from an empty document) are returned unchanged.
pub async fn embed_documents(
    embedder: &dyn Embedder,
    docs: &[Document],
    batch_size: usize,
) -> Result<Vec<Vec<f64>>, EmbeddingError> {
    let batch_size = batch_size.max(1);
    let mut out = Vec::with_capacity(docs.len());

    for (i, batch) in docs.chunks(batch_size).enumerate() {
        let texts: Vec<&str> = batch.iter().map(|d| d.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        debug!(batch = i, size = texts.len(), backend = embedder.name(), "embedded batch");

        out.extend(embeddings.into_iter().map(|v| normalize(&v)));
    }

    Ok(out)
}

/// L2-normalize into `f64`.
fn normalize(v: &[f32]) -> Vec<f64> {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter().map(|&x| x as f64 / norm).collect()
    } else {
        v.iter().map(|&x| x as f64).collect()
    }
}
