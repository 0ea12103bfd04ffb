//! Embedding provider seam and out-of-band entry vectorization.
//!
//! The provider is the only suspension point of a turn. Every call goes
//! through [`embed_with_timeout`]; callers treat any error as "no vector"
//! and continue keyword-only.

use std::time::Duration;

use async_trait::async_trait;
use lore_model::{LoreBook, LoreEntry, TriggerMode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::EmbeddingError;

/// Maximum characters per content chunk.
pub const CHUNK_CHARS: usize = 400;
/// Characters shared by consecutive content chunks.
pub const CHUNK_OVERLAP: usize = 100;
/// Maximum texts embedded per entry, keywords chunk included.
pub const MAX_EMBED_TEXTS: usize = 6;

/// External text-to-vector service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text. All vectors from a provider share one dimensionality.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}

/// Call the provider, failing with [`EmbeddingError::Timeout`] on expiry.
pub async fn embed_with_timeout<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(Ok(vector)) if vector.is_empty() => Err(EmbeddingError::EmptyVector),
        Ok(result) => result,
        Err(_) => Err(EmbeddingError::Timeout(timeout)),
    }
}

/// Texts to embed for an entry: a keywords chunk, then overlapping content
/// chunks, capped at [`MAX_EMBED_TEXTS`].
pub fn build_embed_texts(entry: &LoreEntry) -> Vec<String> {
    let mut texts = Vec::new();

    let keywords = entry.label();
    if !keywords.is_empty() {
        texts.push(keywords);
    }

    let content: Vec<char> = entry.content.trim().chars().collect();
    let mut start = 0;
    while start < content.len() && texts.len() < MAX_EMBED_TEXTS {
        let end = (start + CHUNK_CHARS).min(content.len());
        texts.push(content[start..end].iter().collect());
        start += CHUNK_CHARS - CHUNK_OVERLAP;
    }

    if texts.is_empty() {
        texts.push("empty entry".to_string());
    }
    texts
}

/// Embed an entry's texts and store the resulting chunks.
///
/// Failed chunks are skipped. Returns false when no chunk could be embedded,
/// leaving the entry untouched. A keyword-mode entry becomes vectorized.
pub async fn vectorize_entry<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    entry: &mut LoreEntry,
    timeout: Duration,
) -> bool {
    let mut chunks = Vec::new();
    for text in build_embed_texts(entry) {
        match embed_with_timeout(provider, &text, timeout).await {
            Ok(vector) => chunks.push(vector),
            Err(e) => {
                warn!(
                    entry = %entry.id,
                    provider = provider.name(),
                    error = %e,
                    "chunk embedding failed"
                );
            }
        }
    }

    if chunks.is_empty() {
        return false;
    }

    debug!(entry = %entry.id, chunks = chunks.len(), "entry vectorized");
    entry.embedding_chunks = Some(chunks);
    if entry.trigger_mode == TriggerMode::Keyword {
        entry.trigger_mode = TriggerMode::Vectorized;
    }
    true
}

/// Counts from a batch vectorization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VectorizeReport {
    pub vectorized: usize,
    pub failed: usize,
}

/// Vectorize every enabled entry with content or keywords in enabled books.
pub async fn vectorize_books<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    books: &mut [LoreBook],
    timeout: Duration,
) -> VectorizeReport {
    let mut report = VectorizeReport::default();

    for book in books.iter_mut().filter(|b| b.enabled) {
        for entry in book.entries.iter_mut() {
            if !entry.enabled || (entry.content.trim().is_empty() && entry.keyword.is_empty()) {
                continue;
            }
            if vectorize_entry(provider, entry, timeout).await {
                report.vectorized += 1;
            } else {
                report.failed += 1;
            }
        }
    }

    report
}
