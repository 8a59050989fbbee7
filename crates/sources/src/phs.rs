use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use extract::{RiskFields, RiskPipeline};
use ingest::{BackendSelector, SelectedText};

use crate::error::SourceError;
use crate::http::HttpClient;

/// Outcome of analysing one Product Highlights Sheet
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhsAnalysis {
    /// Winning text backend, absent when no backend produced usable text
    pub selected: Option<SelectedText>,
    pub fields: RiskFields,
}

/// Downloads PHS documents and runs them through backend selection and the risk pipeline
#[derive(Clone)]
pub struct PhsAnalyzer {
    http: HttpClient,
    selector: Arc<BackendSelector>,
    pipeline: Arc<RiskPipeline>,
}

impl PhsAnalyzer {
    pub fn new(http: HttpClient, selector: Arc<BackendSelector>, pipeline: Arc<RiskPipeline>) -> Self {
        Self {
            http,
            selector,
            pipeline,
        }
    }

    /// Risk fields for the document at `url`; any failure yields empty fields
    pub async fn analyze_url(&self, url: &str) -> RiskFields {
        if url.is_empty() {
            return RiskFields::empty();
        }

        match self.download(url).await {
            Ok(bytes) => {
                info!(url, bytes = bytes.len(), "Downloaded PHS document");
                self.analyze_bytes(bytes).await.fields
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to download PHS document");
                RiskFields::empty()
            }
        }
    }

    pub async fn analyze_bytes(&self, bytes: Vec<u8>) -> PhsAnalysis {
        let selected = match self.select_text(bytes).await {
            Ok(selected) => selected,
            Err(e) => {
                warn!(error = %e, "Text extraction aborted");
                None
            }
        };

        let Some(text) = selected.as_ref().map(|s| s.text.as_str()) else {
            return PhsAnalysis::default();
        };
        let fields = self.pipeline.extract_key_risks(text).await;

        PhsAnalysis { selected, fields }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.http.get_bytes(url).await
    }

    /// PDF parsing is CPU-bound, so it runs off the async workers
    async fn select_text(&self, bytes: Vec<u8>) -> Result<Option<SelectedText>, SourceError> {
        let selector = self.selector.clone();
        Ok(tokio::task::spawn_blocking(move || selector.select(&bytes)).await?)
    }
}
