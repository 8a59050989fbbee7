use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use extract::schema::FIELD_SEPARATOR;
use extract::{RiskFields, RiskPipeline, Vocabulary};
use ingest::BackendSelector;
use semantic::OllamaMatcher;
use sources::{FundFetcher, FundRecord, PhsAnalysis, RetryPolicy};
use stamp::Stamper;

use crate::config::AppConfig;
use crate::export::export_csv;
use crate::metrics::{Metrics, TimedOperation};
use crate::summary::BatchSummary;

/// Shared, read-only services behind both the server and the CLI
pub struct AppContext {
    pub config: AppConfig,
    pub pipeline: Arc<RiskPipeline>,
    pub fetcher: FundFetcher,
    pub metrics: Arc<Metrics>,
    pub semantic: Option<Arc<OllamaMatcher>>,
}

#[derive(Debug, Serialize)]
pub struct FundBatch {
    pub records: Vec<FundRecord>,
    pub summary: BatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl AppContext {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let taxonomy = Arc::new(config.taxonomy()?);
        info!(categories = taxonomy.len(), keywords = taxonomy.keywords().len(), "Loaded risk taxonomy");

        let semantic = if config.semantic.enabled {
            semantic::connect(
                &config.semantic.base_url,
                &config.semantic.model,
                config.cache.max_entries,
            )
            .await
        } else {
            None
        };

        let mut pipeline = RiskPipeline::new(taxonomy, Arc::new(Vocabulary::default()));
        if let Some(matcher) = &semantic {
            pipeline = pipeline
                .with_matcher(matcher.clone())
                .with_semantic_threshold(config.semantic.threshold);
        }
        let pipeline = Arc::new(pipeline);

        let fetcher = FundFetcher::new(
            config.fetch.clone(),
            RetryPolicy::from(&config.retry),
            Arc::new(BackendSelector::default()),
            pipeline.clone(),
        )
        .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            pipeline,
            fetcher,
            metrics: Metrics::new(),
            semantic,
        })
    }

    pub fn stamper(&self) -> Stamper {
        self.config.stamper()
    }

    pub fn resolve_template(&self, template: &str) -> PathBuf {
        self.config.resolve_template(template)
    }

    pub async fn analyze_text(&self, text: &str) -> RiskFields {
        let timer = TimedOperation::start();
        let result = self.pipeline.analyze(text).await;
        self.metrics.record_analysis(
            timer.elapsed(),
            result.standard_risks.len(),
            result.other_risks.len(),
        );
        result.to_fields()
    }

    pub async fn analyze_pdf(&self, bytes: Vec<u8>) -> PhsAnalysis {
        let timer = TimedOperation::start();
        let analysis = self.fetcher.phs().analyze_bytes(bytes).await;
        self.metrics.record_analysis(
            timer.elapsed(),
            field_len(&analysis.fields.standard_risks),
            field_len(&analysis.fields.other_risks),
        );
        analysis
    }

    /// Fetch every ISIN, summarise, and optionally write the CSV
    pub async fn fetch_funds<S: AsRef<str>>(&self, isins: &[S], export: bool) -> Result<FundBatch> {
        let timer = TimedOperation::start();
        let records = self.fetcher.fetch_all(isins).await;
        self.metrics.record_fetch(timer.elapsed(), records.len());

        let summary = BatchSummary::from_records(&records);
        summary.log();

        let csv_path = if export && !records.is_empty() {
            Some(export_csv(&self.config.output_dir, &records, Local::now().date_naive())?)
        } else {
            None
        };

        Ok(FundBatch {
            records,
            summary,
            csv_path,
        })
    }
}

/// Entries in a joined spreadsheet cell
fn field_len(field: &str) -> usize {
    field
        .split(FIELD_SEPARATOR)
        .filter(|item| !item.trim().is_empty())
        .count()
}
