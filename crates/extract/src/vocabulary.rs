use std::collections::HashSet;

/// Articles, prepositions, auxiliaries and demonstratives that carry no risk meaning.
pub const DEFAULT_FILLER_WORDS: &[&str] = &[
    "the", "and", "to", "of", "are", "in", "for", "with", "by", "from",
    "an", "a", "or", "but", "as", "at", "be", "been", "have", "has",
    "had", "do", "does", "did", "will", "would", "could", "should",
    "may", "might", "must", "can", "is", "was", "were", "this", "that",
    "these", "those", "on", "up", "down", "over", "under", "through",
];

/// Fragments of boilerplate disclosure text that show up as bogus risk phrases.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    "what risk",
    "investment risk",
    "factors cause",
    "than bonds",
    "their value",
    "generally fall",
    "generally greater",
    "behaviour",
    "unexpected behaviour",
    "factors may cause",
    "lose some all",
];

/// Filler words and noise patterns consulted by the extractor and deduplicator.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    filler_words: HashSet<String>,
    noise_patterns: Vec<String>,
}

impl Vocabulary {
    pub fn new<F, N>(filler_words: F, noise_patterns: N) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            filler_words: filler_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            noise_patterns: noise_patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_filler(&self, word: &str) -> bool {
        self.filler_words.contains(&word.to_lowercase())
    }

    /// True when the lowercased phrase contains any noise pattern
    pub fn contains_noise(&self, phrase: &str) -> bool {
        let lowered = phrase.to_lowercase();
        self.noise_patterns.iter().any(|p| lowered.contains(p.as_str()))
    }

    pub fn filler_words(&self) -> &HashSet<String> {
        &self.filler_words
    }

    pub fn noise_patterns(&self) -> &[String] {
        &self.noise_patterns
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_FILLER_WORDS, DEFAULT_NOISE_PATTERNS)
    }
}
