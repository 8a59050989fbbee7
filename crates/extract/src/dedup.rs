use std::collections::HashSet;
use std::sync::Arc;

use crate::normalizer::{normalize_phrase, singularize};
use crate::vocabulary::Vocabulary;

/// Normalized phrases this short are extraction debris
const MIN_NORMALIZED_LEN: usize = 5;
/// Share of filler tokens above which a phrase is noise
const MAX_FILLER_RATIO: f64 = 0.6;
/// Meaningful-token overlap above which two phrases are the same risk
const SIMILARITY_THRESHOLD: f64 = 0.7;

pub struct Deduplicator {
    vocabulary: Arc<Vocabulary>,
}

impl Deduplicator {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Drop repeated and trivially short phrases, keeping first occurrences in order
    pub fn dedupe_raw<S: AsRef<str>>(&self, phrases: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        for phrase in phrases {
            let phrase = phrase.as_ref();
            let normalized = normalize_phrase(phrase);

            if normalized.chars().count() > MIN_NORMALIZED_LEN && seen.insert(normalized) {
                unique.push(phrase.to_string());
            }
        }

        unique
    }

    /// Remove noise from unmatched phrases, then collapse near-duplicates.
    ///
    /// The collapse is greedy: phrases are visited in order and the first
    /// member of a group is the one kept, so the output depends on input order.
    pub fn dedupe_other<S: AsRef<str>>(&self, phrases: &[S]) -> Vec<String> {
        let mut kept: Vec<(String, HashSet<String>)> = Vec::new();

        for phrase in phrases.iter().map(AsRef::as_ref) {
            if self.is_noise(phrase) {
                continue;
            }

            let tokens = self.meaningful_tokens(phrase);
            if kept.iter().any(|(_, existing)| overlap_ratio(&tokens, existing) > SIMILARITY_THRESHOLD) {
                continue;
            }
            kept.push((phrase.to_string(), tokens));
        }

        kept.into_iter().map(|(phrase, _)| phrase).collect()
    }

    /// Boilerplate fragments, single words, and filler-heavy phrases
    pub fn is_noise(&self, phrase: &str) -> bool {
        if self.vocabulary.contains_noise(phrase) {
            return true;
        }

        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() < 2 {
            return true;
        }

        let filler = words.iter().filter(|w| self.vocabulary.is_filler(w)).count();
        filler as f64 / words.len() as f64 > MAX_FILLER_RATIO
    }

    pub fn are_similar(&self, a: &str, b: &str) -> bool {
        overlap_ratio(&self.meaningful_tokens(a), &self.meaningful_tokens(b)) > SIMILARITY_THRESHOLD
    }

    fn meaningful_tokens(&self, phrase: &str) -> HashSet<String> {
        normalize_phrase(phrase)
            .split_whitespace()
            .filter(|w| w.chars().count() > 2 && !self.vocabulary.is_filler(w))
            .map(singularize)
            .collect()
    }
}

/// Intersection size over the smaller set; zero when either set is empty
fn overlap_ratio(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / smaller as f64
}
