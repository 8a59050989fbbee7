//! Document loading and PDF text extraction with backend selection.

pub mod backend;
pub mod reader;
pub mod selector;

pub use backend::{
    default_backends, ContentStreamBackend, LopdfTextBackend, PdfExtractBackend, TextBackend,
};
pub use reader::{DocumentContent, FileReader};
pub use selector::{count_risk_mentions, select_best, BackendSelector, SelectedText};

use anyhow::Result;
use std::path::Path;

/// Backend name reported for documents that were already plain text
pub const PLAIN_TEXT: &str = "plain-text";

/// Text for an already loaded document; PDFs go through backend selection
pub fn document_text(content: DocumentContent, selector: &BackendSelector) -> Option<SelectedText> {
    match content {
        DocumentContent::Pdf(bytes) => selector.select(&bytes),
        DocumentContent::Text(text) => select_best([(PLAIN_TEXT.to_string(), text)]),
    }
}

/// Load a document from disk and pick its best text
pub async fn ingest_file(file_path: &Path, selector: &BackendSelector) -> Result<Option<SelectedText>> {
    let content = FileReader::read_file(file_path).await?;
    Ok(document_text(content, selector))
}

/// Load every supported document in a directory
pub async fn ingest_directory(
    dir_path: &Path,
    selector: &BackendSelector,
) -> Result<Vec<(String, Option<SelectedText>)>> {
    let files = FileReader::read_directory(dir_path).await?;

    Ok(files
        .into_iter()
        .map(|(path, content)| (path, document_text(content, selector)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_without_risk_is_not_selected() {
        let selector = BackendSelector::new(Vec::new());
        assert!(document_text(DocumentContent::Text("bonds".into()), &selector).is_none());

        let selected = document_text(DocumentContent::Text("credit risk".into()), &selector).unwrap();
        assert_eq!(selected.backend, PLAIN_TEXT);
        assert_eq!(selected.risk_mentions, 1);
    }
}
