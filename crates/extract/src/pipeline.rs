use std::sync::Arc;

use tracing::info;

use crate::classifier::RiskClassifier;
use crate::matcher::EmbeddingMatcher;
use crate::phrase::PhraseExtractor;
use crate::schema::{ClassificationResult, RiskFields};
use crate::taxonomy::RiskTaxonomy;
use crate::vocabulary::Vocabulary;

/// Document text in, standard and other risks out
pub struct RiskPipeline {
    extractor: PhraseExtractor,
    classifier: RiskClassifier,
}

impl RiskPipeline {
    pub fn new(taxonomy: Arc<RiskTaxonomy>, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            extractor: PhraseExtractor::new(vocabulary.clone()),
            classifier: RiskClassifier::new(taxonomy, vocabulary),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn EmbeddingMatcher>) -> Self {
        self.classifier = self.classifier.with_matcher(matcher);
        self
    }

    pub fn with_semantic_threshold(mut self, threshold: f32) -> Self {
        self.classifier = self.classifier.with_semantic_threshold(threshold);
        self
    }

    pub fn extractor(&self) -> &PhraseExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub async fn analyze(&self, text: &str) -> ClassificationResult {
        let phrases = self.extractor.extract(text);
        if phrases.is_empty() {
            return ClassificationResult::default();
        }

        let result = self.classifier.classify(&phrases).await;
        info!(
            raw_phrases = phrases.len(),
            standard_risks = result.standard_risks.len(),
            other_risks = result.other_risks.len(),
            "Risk extraction complete"
        );
        result
    }

    /// The two spreadsheet cells for one document
    pub async fn extract_key_risks(&self, text: &str) -> RiskFields {
        self.analyze(text).await.to_fields()
    }
}

impl Default for RiskPipeline {
    fn default() -> Self {
        Self::new(
            Arc::new(RiskTaxonomy::fund_risks()),
            Arc::new(Vocabulary::default()),
        )
    }
}
