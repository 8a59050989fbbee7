use anyhow::Result;
use async_trait::async_trait;

use crate::taxonomy::RiskCategory;

/// Embedding-based closeness between a phrase and a risk category.
///
/// Implementations may be stateful (caches, HTTP clients) but must tolerate
/// concurrent calls from several documents at once.
#[async_trait]
pub trait EmbeddingMatcher: Send + Sync {
    /// Cosine similarity of the phrase to the category definition
    async fn similarity(&self, phrase: &str, category: &RiskCategory) -> Result<f32>;

    fn name(&self) -> &str {
        "embedding"
    }
}
