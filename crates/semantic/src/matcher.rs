use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use extract::{EmbeddingMatcher, RiskCategory};

use crate::cache::EmbeddingCache;
use crate::embeddings::{cosine_similarity, EmbeddingClient};

/// Compares phrases with category definitions through a remote embedding model.
///
/// Definitions are embedded once and cached, so scoring a phrase against the
/// whole taxonomy costs one embedding request.
pub struct OllamaMatcher {
    client: EmbeddingClient,
    cache: EmbeddingCache,
}

impl OllamaMatcher {
    pub fn new(client: EmbeddingClient, cache: EmbeddingCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    async fn embedding(&self, text: &str) -> Result<Arc<Vec<f32>>> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(hit);
        }

        let embedding = self.client.embed(text).await?;
        debug!(model = self.client.model(), dims = embedding.len(), "Embedded text");
        Ok(self.cache.set(text, embedding))
    }
}

#[async_trait]
impl EmbeddingMatcher for OllamaMatcher {
    async fn similarity(&self, phrase: &str, category: &RiskCategory) -> Result<f32> {
        let phrase_embedding = self.embedding(&phrase.to_lowercase()).await?;
        let category_embedding = self.embedding(&category.definition).await?;
        Ok(cosine_similarity(&phrase_embedding, &category_embedding))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{MatchStage, RiskClassifier, RiskTaxonomy, Vocabulary};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_embedding(server: &MockServer, prompt: &str, embedding: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(json!({ "prompt": prompt })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": embedding })))
            .mount(server)
            .await;
    }

    fn taxonomy() -> Arc<RiskTaxonomy> {
        Arc::new(
            RiskTaxonomy::builder()
                .category_with_definition(
                    "Counterparty Risk",
                    "counterparty default inability to meet obligations",
                    ["counterparty risk"],
                )
                .category_with_definition("Climate Risk", "climate change", ["climate risk"])
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_similarity_uses_definition_and_caches() {
        let server = MockServer::start().await;
        mock_embedding(&server, "swap dealer collapse", json!([1.0, 0.0])).await;
        mock_embedding(
            &server,
            "counterparty default inability to meet obligations",
            json!([0.8, 0.6]),
        )
        .await;

        let matcher = OllamaMatcher::new(
            EmbeddingClient::new(server.uri(), "all-minilm"),
            EmbeddingCache::new(100),
        );
        let taxonomy = taxonomy();
        let category = &taxonomy.categories()[0];

        let score = matcher.similarity("Swap Dealer Collapse", category).await.unwrap();
        assert!((score - 0.8).abs() < 1e-6);
        assert_eq!(matcher.cache().len(), 2);

        // served from cache
        let again = matcher.similarity("swap dealer collapse", category).await.unwrap();
        assert_eq!(score, again);
        assert_eq!(matcher.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_classifier_semantic_stage() {
        let server = MockServer::start().await;
        mock_embedding(&server, "swap dealer collapse", json!([1.0, 0.0])).await;
        mock_embedding(
            &server,
            "counterparty default inability to meet obligations",
            json!([0.9, 0.1]),
        )
        .await;
        mock_embedding(&server, "climate change", json!([0.0, 1.0])).await;

        let matcher = OllamaMatcher::new(
            EmbeddingClient::new(server.uri(), "all-minilm"),
            EmbeddingCache::new(100),
        );
        let classifier = RiskClassifier::new(taxonomy(), Arc::new(Vocabulary::default()))
            .with_matcher(Arc::new(matcher));

        let found = classifier.match_phrase("Swap Dealer Collapse").await.unwrap();
        assert_eq!(found.standard_name, "Counterparty Risk");
        assert_eq!(found.stage, MatchStage::Semantic);
    }

    #[tokio::test]
    async fn test_unreachable_backend_leaves_phrase_unmatched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let matcher = OllamaMatcher::new(
            EmbeddingClient::new(server.uri(), "all-minilm"),
            EmbeddingCache::new(100),
        );
        let classifier = RiskClassifier::new(taxonomy(), Arc::new(Vocabulary::default()))
            .with_matcher(Arc::new(matcher));

        assert!(classifier.match_phrase("Swap Dealer Collapse").await.is_none());
    }
}
