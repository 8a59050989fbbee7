use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalizer::{normalize, title_case};
use crate::schema::RawPhrase;
use crate::vocabulary::Vocabulary;

/// Tokens taken on each side of a trigger
pub const RISK_PHRASE_WINDOW: usize = 3;

const TRIGGER_PREFIX: &str = "risk";

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Cuts risk phrases out of document text
pub struct PhraseExtractor {
    vocabulary: Arc<Vocabulary>,
}

impl PhraseExtractor {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Cleaned, title-cased phrases in document order
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.extract_raw(text)
            .into_iter()
            .map(|phrase| phrase.cleaned)
            .collect()
    }

    /// Every trigger window that survives cleaning, with its source span
    pub fn extract_raw(&self, text: &str) -> Vec<RawPhrase> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = WORD.find_iter(&normalized).map(|m| m.as_str()).collect();
        let mut phrases = Vec::new();

        for (i, word) in words.iter().enumerate() {
            // 'risk', 'risks', 'riskier', ...
            if !word.starts_with(TRIGGER_PREFIX) {
                continue;
            }

            let start = i.saturating_sub(RISK_PHRASE_WINDOW);
            let end = (i + RISK_PHRASE_WINDOW + 1).min(words.len());
            let span = words[start..end].join(" ");

            if let Some(cleaned) = self.clean_phrase(&span) {
                phrases.push(RawPhrase {
                    span,
                    cleaned,
                    trigger_index: i,
                });
            }
        }

        phrases
    }

    /// Strip parentheses and filler words, title-case, and make sure it reads as a risk
    pub fn clean_phrase(&self, phrase: &str) -> Option<String> {
        let without_parens = PARENTHESIZED.replace_all(phrase, "");

        let words: Vec<String> = without_parens
            .split_whitespace()
            .filter(|w| !self.vocabulary.is_filler(w))
            .map(title_case)
            .collect();

        if words.is_empty() {
            return None;
        }

        let mut cleaned = words.join(" ");
        if !cleaned.to_lowercase().ends_with(TRIGGER_PREFIX) {
            cleaned.push_str(" Risk");
        }
        Some(cleaned)
    }
}
