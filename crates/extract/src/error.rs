//! Error types for taxonomy construction

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaxonomyError {
    #[error("keyword '{keyword}' is claimed by both '{first}' and '{second}'")]
    DuplicateKeyword {
        keyword: String,
        first: String,
        second: String,
    },

    #[error("standard risk '{0}' is defined more than once")]
    DuplicateCategory(String),

    #[error("standard risk '{0}' has no keywords")]
    EmptyCategory(String),

    #[error("failed to read taxonomy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse taxonomy file: {0}")]
    Parse(#[from] serde_json::Error),
}
