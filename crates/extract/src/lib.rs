//! Risk phrase extraction and classification for fund disclosure documents.

pub mod classifier;
pub mod dedup;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod phrase;
pub mod pipeline;
pub mod schema;
pub mod taxonomy;
pub mod vocabulary;

pub use classifier::{RiskClassifier, DEFAULT_SEMANTIC_THRESHOLD};
pub use dedup::Deduplicator;
pub use error::TaxonomyError;
pub use matcher::EmbeddingMatcher;
pub use normalizer::normalize;
pub use phrase::PhraseExtractor;
pub use pipeline::RiskPipeline;
pub use schema::{ClassificationResult, MatchStage, RawPhrase, RiskFields, RiskMatch};
pub use taxonomy::{RiskCategory, RiskTaxonomy};
pub use vocabulary::Vocabulary;
