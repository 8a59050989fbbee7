use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use extract::RiskPipeline;
use ingest::BackendSelector;

use crate::error::SourceError;
use crate::ft::{FtScraper, TearsheetData};
use crate::http::HttpClient;
use crate::morningstar::{retail_ai_classification, BasicInfo, MorningstarClient};
use crate::phs::PhsAnalyzer;
use crate::record::{sector, FundRecord};
use crate::retry::RetryPolicy;
use crate::settings::FetchSettings;

/// Builds one spreadsheet row per ISIN from every source.
///
/// A failing source blanks only its own fields; nothing here aborts a batch.
pub struct FundFetcher {
    morningstar: MorningstarClient,
    ft: FtScraper,
    phs: PhsAnalyzer,
    delay: Duration,
}

impl FundFetcher {
    pub fn new(
        settings: FetchSettings,
        retry: RetryPolicy,
        selector: Arc<BackendSelector>,
        pipeline: Arc<RiskPipeline>,
    ) -> Result<Self, SourceError> {
        let http = HttpClient::new(&settings, retry)?;
        Ok(Self {
            ft: FtScraper::new(http.clone(), settings.endpoints.tearsheet.clone()),
            phs: PhsAnalyzer::new(http.clone(), selector, pipeline),
            delay: settings.delay(),
            morningstar: MorningstarClient::new(http, settings),
        })
    }

    pub fn phs(&self) -> &PhsAnalyzer {
        &self.phs
    }

    pub async fn fetch_fund(&self, isin: &str) -> FundRecord {
        let isin = isin.trim();
        let retail_ai = retail_ai_classification(isin);
        let factsheet = self.morningstar.factsheet_url(isin);

        info!(isin, "Fetching Morningstar data");
        let basic = self.morningstar.fetch_basic_info(isin).await.unwrap_or_else(|e| {
            warn!(isin, error = %e, "Morningstar basic info unavailable");
            BasicInfo::default()
        });

        info!(isin, "Fetching FT data");
        let tearsheet = self.ft.fetch(isin).await.unwrap_or_else(|e| {
            warn!(isin, error = %e, "FT tearsheet unavailable");
            TearsheetData::default()
        });

        info!(isin, "Fetching PHS link");
        let phs_link = match self.morningstar.fetch_phs_link(isin).await {
            Ok(link) => link.unwrap_or_default(),
            Err(e) => {
                warn!(isin, error = %e, "PHS lookup failed");
                String::new()
            }
        };

        let risks = self.phs.analyze_url(&phs_link).await;

        FundRecord {
            sector: sector(&basic.asset_type, &tearsheet.morningstar_category),
            no: 0,
            fund_house: basic.fund_house,
            fund_name: basic.fund_name,
            isin: isin.to_string(),
            retail_ai: retail_ai.to_string(),
            asset_type: basic.asset_type,
            geographic: tearsheet.geographic,
            launch_date: tearsheet.launch_date,
            annual_management_fee: tearsheet.ongoing_charge,
            factsheet,
            phs_link,
            investment_objective: tearsheet.investment_objective,
            standard_risks: risks.standard_risks,
            other_risks: risks.other_risks,
            pspl_risk_classification: basic.risk_classification,
        }
    }

    /// Process ISINs one at a time, pausing between them; rows are numbered from 1
    pub async fn fetch_all<S: AsRef<str>>(&self, isins: &[S]) -> Vec<FundRecord> {
        let isins: Vec<&str> = isins
            .iter()
            .map(|i| i.as_ref().trim())
            .filter(|i| !i.is_empty())
            .collect();
        let total = isins.len();
        let mut records = Vec::with_capacity(total);

        for (i, isin) in isins.iter().enumerate() {
            info!(isin, item = i + 1, total, "Processing fund");
            let mut record = self.fetch_fund(isin).await;
            record.no = i + 1;
            records.push(record);

            if i + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        records
    }
}
