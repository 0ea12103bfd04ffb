//! Vector similarity for embedding-based matching.

use tracing::debug;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the dimensions differ, either vector is empty, or either
/// has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Best similarity between a query and any chunk, floored at zero.
pub fn max_similarity(query: &[f32], chunks: &[Vec<f32>]) -> f32 {
    chunks.iter().fold(0.0f32, |best, chunk| {
        if chunk.len() != query.len() {
            debug!(
                query_dims = query.len(),
                chunk_dims = chunk.len(),
                "embedding dimension mismatch, treating as zero similarity"
            );
            return best;
        }
        best.max(cosine_similarity(query, chunk))
    })
}
