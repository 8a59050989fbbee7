use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Concurrent embedding cache keyed by a hash of the embedded text
#[derive(Clone)]
pub struct EmbeddingCache {
    embeddings: Arc<DashMap<String, Arc<Vec<f32>>>>,
    max_entries: usize,
}

impl EmbeddingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            embeddings: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn set(&self, text: &str, embedding: Vec<f32>) -> Arc<Vec<f32>> {
        let embedding = Arc::new(embedding);
        if self.max_entries == 0 {
            return embedding;
        }

        if self.embeddings.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .embeddings
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.embeddings.remove(&key);
            }
        }

        self.embeddings.insert(hash_text(text), embedding.clone());
        embedding
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.embeddings
            .get(&hash_text(text))
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            embeddings_cached: self.embeddings.len(),
            max_entries: self.max_entries,
        }
    }

    pub fn clear(&self) {
        self.embeddings.clear();
    }
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub embeddings_cached: usize,
    pub max_entries: usize,
}
