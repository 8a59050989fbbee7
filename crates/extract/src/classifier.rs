use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dedup::Deduplicator;
use crate::matcher::EmbeddingMatcher;
use crate::normalizer::normalize_plurals;
use crate::schema::{ClassificationResult, MatchStage, RiskMatch};
use crate::taxonomy::{KeywordEntry, RiskCategory, RiskTaxonomy};
use crate::vocabulary::Vocabulary;

pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.65;

/// Share of a keyword's words that must appear in the phrase
const OVERLAP_COVERAGE: f64 = 0.8;
const MIN_OVERLAP_WORDS: usize = 2;

/// Maps extracted phrases onto standard risk names.
///
/// Matching escalates through exact keyword, plural-normalized keyword,
/// word overlap and (when a matcher is attached) embedding similarity.
/// The first stage that matches decides the category.
pub struct RiskClassifier {
    taxonomy: Arc<RiskTaxonomy>,
    deduplicator: Deduplicator,
    matcher: Option<Arc<dyn EmbeddingMatcher>>,
    semantic_threshold: f32,
}

impl RiskClassifier {
    pub fn new(taxonomy: Arc<RiskTaxonomy>, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            taxonomy,
            deduplicator: Deduplicator::new(vocabulary),
            matcher: None,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn EmbeddingMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn with_semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    pub fn taxonomy(&self) -> &RiskTaxonomy {
        &self.taxonomy
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.deduplicator
    }

    pub fn has_semantic_stage(&self) -> bool {
        self.matcher.is_some()
    }

    /// Classify a batch of extracted phrases
    pub async fn classify<S: AsRef<str>>(&self, phrases: &[S]) -> ClassificationResult {
        let unique = self.deduplicator.dedupe_raw(phrases);

        let mut standard_risks = BTreeSet::new();
        let mut unmatched = Vec::new();

        for phrase in unique {
            match self.match_phrase(&phrase).await {
                Some(found) => {
                    debug!(
                        phrase = %phrase,
                        standard = %found.standard_name,
                        stage = ?found.stage,
                        "Phrase classified"
                    );
                    standard_risks.insert(found.standard_name);
                }
                None => unmatched.push(phrase),
            }
        }

        let other_risks = self.deduplicator.dedupe_other(&unmatched);
        debug!(
            standard = standard_risks.len(),
            unmatched = unmatched.len(),
            other = other_risks.len(),
            "Classification finished"
        );

        ClassificationResult {
            standard_risks,
            other_risks,
        }
    }

    /// All four stages, semantic last
    pub async fn match_phrase(&self, phrase: &str) -> Option<RiskMatch> {
        if let Some(found) = self.match_rules(phrase) {
            return Some(found);
        }
        self.match_semantic(phrase).await
    }

    /// Keyword stages only: exact, plural-normalized, word overlap
    pub fn match_rules(&self, phrase: &str) -> Option<RiskMatch> {
        let lowered = phrase.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        if let Some(keyword) = self.find_keyword(&lowered, false) {
            return Some(self.keyword_match(keyword, MatchStage::Exact));
        }

        let singular = normalize_plurals(&lowered);
        if let Some(keyword) = self.find_keyword(&singular, true) {
            return Some(self.keyword_match(keyword, MatchStage::PluralNormalized));
        }

        let words: HashSet<&str> = lowered.split_whitespace().collect();
        self.taxonomy
            .keywords()
            .iter()
            .find(|keyword| {
                let overlap = keyword
                    .tokens
                    .iter()
                    .filter(|t| words.contains(t.as_str()))
                    .count();
                overlap >= MIN_OVERLAP_WORDS
                    && overlap as f64 >= keyword.tokens.len() as f64 * OVERLAP_COVERAGE
            })
            .map(|keyword| self.keyword_match(keyword, MatchStage::WordOverlap))
    }

    /// Leftmost keyword occurrence; longer keywords win at the same position,
    /// then taxonomy order.
    fn find_keyword(&self, haystack: &str, plural_normalized: bool) -> Option<&KeywordEntry> {
        let mut best: Option<(usize, usize, &KeywordEntry)> = None;

        for keyword in self.taxonomy.keywords() {
            let needle = if plural_normalized {
                keyword.plural_normalized.as_str()
            } else {
                keyword.text.as_str()
            };

            let Some(pos) = haystack.find(needle) else {
                continue;
            };

            let better = match best {
                None => true,
                Some((best_pos, best_len, _)) => {
                    pos < best_pos || (pos == best_pos && needle.len() > best_len)
                }
            };
            if better {
                best = Some((pos, needle.len(), keyword));
            }
        }

        best.map(|(_, _, keyword)| keyword)
    }

    fn keyword_match(&self, keyword: &KeywordEntry, stage: MatchStage) -> RiskMatch {
        RiskMatch {
            standard_name: self.taxonomy.category_of(keyword).name.clone(),
            stage,
            keyword: Some(keyword.text.clone()),
        }
    }

    async fn match_semantic(&self, phrase: &str) -> Option<RiskMatch> {
        let matcher = self.matcher.as_ref()?;

        let mut best: Option<(f32, &RiskCategory)> = None;
        for category in self.taxonomy.categories() {
            match matcher.similarity(phrase, category).await {
                Ok(score) => {
                    if best.is_none_or(|(top, _)| score > top) {
                        best = Some((score, category));
                    }
                }
                Err(e) => {
                    warn!(
                        phrase = %phrase,
                        matcher = matcher.name(),
                        error = %e,
                        "Semantic matching failed, leaving phrase unmatched"
                    );
                    return None;
                }
            }
        }

        let (score, category) = best?;
        if score >= self.semantic_threshold {
            Some(RiskMatch {
                standard_name: category.name.clone(),
                stage: MatchStage::Semantic,
                keyword: None,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    fn classifier() -> RiskClassifier {
        RiskClassifier::new(
            Arc::new(RiskTaxonomy::fund_risks()),
            Arc::new(Vocabulary::default()),
        )
    }

    struct FixedMatcher {
        target: &'static str,
        score: f32,
    }

    #[async_trait]
    impl EmbeddingMatcher for FixedMatcher {
        async fn similarity(&self, _phrase: &str, category: &RiskCategory) -> Result<f32> {
            Ok(if category.name == self.target { self.score } else { 0.1 })
        }
    }

    struct BrokenMatcher;

    #[async_trait]
    impl EmbeddingMatcher for BrokenMatcher {
        async fn similarity(&self, _phrase: &str, _category: &RiskCategory) -> Result<f32> {
            bail!("embedding backend unavailable")
        }
    }

    #[test]
    fn test_exact_match() {
        let found = classifier().match_rules("Significant Credit Risk Market Risk").unwrap();
        assert_eq!(found.standard_name, "Credit Risk");
        assert_eq!(found.stage, MatchStage::Exact);
        assert_eq!(found.keyword.as_deref(), Some("credit risk"));
    }

    #[test]
    fn test_leftmost_keyword_wins() {
        let found = classifier().match_rules("Risk Market Risk Due Economic Risk").unwrap();
        assert_eq!(found.standard_name, "Market Risk");
    }

    #[test]
    fn test_longer_keyword_wins_at_same_position() {
        // "interest rate risk" and "interest rate risks" both start at 0
        let found = classifier().match_rules("Interest Rate Risks Fund").unwrap();
        assert_eq!(found.keyword.as_deref(), Some("interest rate risks"));
        assert_eq!(found.standard_name, "Interest Rate Risk");
    }

    #[test]
    fn test_plural_normalized_match() {
        let taxonomy = RiskTaxonomy::builder()
            .category("Perpetual Bond Risk", ["perpetual bond risk"])
            .build()
            .unwrap();
        let classifier = RiskClassifier::new(Arc::new(taxonomy), Arc::new(Vocabulary::default()));

        let found = classifier.match_rules("Perpetual Bonds Risks Apply").unwrap();
        assert_eq!(found.stage, MatchStage::PluralNormalized);
        assert_eq!(found.standard_name, "Perpetual Bond Risk");
    }

    #[test]
    fn test_word_overlap_match() {
        let taxonomy = RiskTaxonomy::builder()
            .category("Currency Risk", ["foreign exchange risk"])
            .build()
            .unwrap();
        let classifier = RiskClassifier::new(Arc::new(taxonomy), Arc::new(Vocabulary::default()));

        // all three keyword words present, out of order
        let found = classifier.match_rules("Exchange Foreign Currency Risk").unwrap();
        assert_eq!(found.stage, MatchStage::WordOverlap);
        assert_eq!(found.standard_name, "Currency Risk");

        // only one of three words
        assert!(classifier.match_rules("Exchange Listing Delay").is_none());
    }

    #[test]
    fn test_word_overlap_needs_two_words() {
        let taxonomy = RiskTaxonomy::builder()
            .category("Liquidity Risk", ["illiquidity"])
            .build()
            .unwrap();
        let classifier = RiskClassifier::new(Arc::new(taxonomy), Arc::new(Vocabulary::default()));
        assert!(classifier.match_rules("Illiquid Holdings Risk").is_none());
    }

    #[test]
    fn test_exact_beats_word_overlap() {
        let taxonomy = RiskTaxonomy::builder()
            .category("Overlap Risk", ["risk market"])
            .category("Market Risk", ["market risk"])
            .build()
            .unwrap();
        let classifier = RiskClassifier::new(Arc::new(taxonomy), Arc::new(Vocabulary::default()));

        // "risk market" is not a substring, but both of its words are present
        let found = classifier.match_rules("Emerging Market Risk").unwrap();
        assert_eq!(found.stage, MatchStage::Exact);
        assert_eq!(found.standard_name, "Market Risk");
    }

    #[test]
    fn test_unmatched_phrase() {
        let taxonomy = RiskTaxonomy::builder()
            .category("Market Risk", ["market risk"])
            .build()
            .unwrap();
        let classifier = RiskClassifier::new(Arc::new(taxonomy), Arc::new(Vocabulary::default()));
        assert!(classifier.match_rules("Opaque Derivative Structure Risk").is_none());
        assert!(classifier.match_rules("").is_none());
    }

    #[tokio::test]
    async fn test_classify_sorts_and_dedupes() {
        let phrases = [
            "Significant Credit Risk Market Risk",
            "Risk Market Risk Due Economic Risk",
            "Market Volatility Risk",
        ];
        let result = classifier().classify(&phrases).await;
        let names: Vec<&str> = result.standard_risks.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Credit Risk", "Market Risk"]);
        assert!(result.other_risks.is_empty());
    }

    #[tokio::test]
    async fn test_classify_empty() {
        let empty: [&str; 0] = [];
        let result = classifier().classify(&empty).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_classify_is_deterministic() {
        let phrases = [
            "Opaque Derivative Structure Risk",
            "Foreign Exchange Risk",
            "Settlement Delay Risk Arising",
            "Opaque Derivatives Structures Risk",
        ];
        let c = classifier();
        let first = c.classify(&phrases).await;
        for _ in 0..5 {
            assert_eq!(c.classify(&phrases).await, first);
        }
    }

    #[tokio::test]
    async fn test_semantic_stage_above_threshold() {
        let c = classifier().with_matcher(Arc::new(FixedMatcher {
            target: "Counterparty Risk",
            score: 0.8,
        }));
        assert!(c.has_semantic_stage());

        let found = c.match_phrase("Settlement Failure Exposure").await.unwrap();
        assert_eq!(found.standard_name, "Counterparty Risk");
        assert_eq!(found.stage, MatchStage::Semantic);
        assert!(found.keyword.is_none());
    }

    #[tokio::test]
    async fn test_semantic_stage_below_threshold() {
        let c = classifier().with_matcher(Arc::new(FixedMatcher {
            target: "Counterparty Risk",
            score: 0.6,
        }));
        assert!(c.match_phrase("Settlement Failure Exposure").await.is_none());

        let lowered = c.with_semantic_threshold(0.5);
        assert!(lowered.match_phrase("Settlement Failure Exposure").await.is_some());
    }

    #[tokio::test]
    async fn test_rules_win_over_semantic() {
        let c = classifier().with_matcher(Arc::new(FixedMatcher {
            target: "Climate Risk",
            score: 0.99,
        }));
        let found = c.match_phrase("Credit Risk").await.unwrap();
        assert_eq!(found.standard_name, "Credit Risk");
        assert_eq!(found.stage, MatchStage::Exact);
    }

    #[tokio::test]
    async fn test_semantic_failure_falls_through() {
        let c = classifier().with_matcher(Arc::new(BrokenMatcher));
        assert!(c.match_phrase("Settlement Failure Exposure").await.is_none());

        let result = c
            .classify(&["Credit Risk", "Settlement Failure Exposure Risk"])
            .await;
        assert_eq!(result.standard_risks.len(), 1);
        assert_eq!(result.other_risks, vec!["Settlement Failure Exposure Risk"]);
    }
}
