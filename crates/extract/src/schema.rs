use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Separator used when risk lists are flattened into a spreadsheet cell
pub const FIELD_SEPARATOR: &str = "; ";

/// A context window cut around a trigger token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhrase {
    /// Window tokens joined by single spaces
    pub span: String,
    /// Filler-free, title-cased form
    pub cleaned: String,
    /// Position of the trigger token in the token sequence
    pub trigger_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    PluralNormalized,
    WordOverlap,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMatch {
    pub standard_name: String,
    pub stage: MatchStage,
    /// Matching keyword; absent for semantic matches
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub standard_risks: BTreeSet<String>,
    pub other_risks: Vec<String>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.standard_risks.is_empty() && self.other_risks.is_empty()
    }

    pub fn to_fields(&self) -> RiskFields {
        RiskFields {
            standard_risks: self
                .standard_risks
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(FIELD_SEPARATOR),
            other_risks: self.other_risks.join(FIELD_SEPARATOR),
        }
    }
}

/// The two spreadsheet cells produced per document. Empty means nothing extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFields {
    pub standard_risks: String,
    pub other_risks: String,
}

impl RiskFields {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.standard_risks, &self.other_risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_joined() {
        let result = ClassificationResult {
            standard_risks: ["Market Risk", "Credit Risk"].into_iter().map(String::from).collect(),
            other_risks: vec!["Opaque Structure Risk".to_string(), "Odd Thing Risk".to_string()],
        };

        let fields = result.to_fields();
        assert_eq!(fields.standard_risks, "Credit Risk; Market Risk");
        assert_eq!(fields.other_risks, "Opaque Structure Risk; Odd Thing Risk");
    }

    #[test]
    fn test_empty_result_gives_empty_fields() {
        let result = ClassificationResult::default();
        assert!(result.is_empty());
        assert_eq!(result.to_fields().as_pair(), ("", ""));
    }
}
