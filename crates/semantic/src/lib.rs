//! Optional embedding-similarity stage for risk classification.

pub mod cache;
pub mod embeddings;
pub mod matcher;

pub use cache::{CacheStats, EmbeddingCache};
pub use embeddings::{cosine_similarity, EmbeddingClient, DEFAULT_EMBEDDING_MODEL, DEFAULT_OLLAMA_URL};
pub use matcher::OllamaMatcher;

use std::sync::Arc;
use tracing::{info, warn};

/// Build the matcher only if the embedding service answers.
///
/// An unreachable service disables the semantic stage instead of failing startup.
pub async fn connect(base_url: &str, model: &str, cache_entries: usize) -> Option<Arc<OllamaMatcher>> {
    let client = EmbeddingClient::new(base_url, model);
    match client.get_dimension().await {
        Ok(dims) => {
            info!(base_url, model, dims, "Semantic matching enabled");
            Some(Arc::new(OllamaMatcher::new(client, EmbeddingCache::new(cache_entries))))
        }
        Err(e) => {
            warn!(base_url, model, error = %e, "Embedding service unavailable, semantic matching disabled");
            None
        }
    }
}

