use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Raw content of a document on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    Pdf(Vec<u8>),
    Text(String),
}

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<DocumentContent> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => {
                let bytes = fs::read(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                Ok(DocumentContent::Pdf(bytes))
            }
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                Ok(DocumentContent::Text(content))
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Every supported document directly inside `dir`, sorted by path.
    /// Files that fail to read are logged and skipped.
    pub async fn read_directory(dir: &Path) -> Result<Vec<(String, DocumentContent)>> {
        let mut files = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() || !Self::is_supported(&path) {
                continue;
            }
            let content = match Self::read_file(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                    continue;
                }
            };
            files.push((path.to_string_lossy().to_string(), content));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "md"))
    }
}
