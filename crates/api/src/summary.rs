use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{info, warn};

use extract::schema::FIELD_SEPARATOR;
use sources::FundRecord;

const TOP_RISKS: usize = 10;
const BLANK_LABEL: &str = "(Blank)";

/// Columns whose blanks need follow-up before onboarding
pub const CRITICAL_COLUMNS: [&str; 5] = [
    "Asset",
    "Retail/AI",
    "Investment Objective",
    "Key Risks for Investors",
    "PSPL Risk Classification",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_funds: usize,
    pub funds_with_standard_risks: usize,
    pub funds_with_other_risks: usize,
    /// Most common standard risks, most frequent first
    pub top_standard_risks: Vec<(String, usize)>,
    /// Blank cells per column, columns without blanks omitted
    pub blank_counts: BTreeMap<String, usize>,
    pub asset_distribution: BTreeMap<String, usize>,
    pub retail_ai_distribution: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_records(records: &[FundRecord]) -> Self {
        let mut summary = BatchSummary {
            total_funds: records.len(),
            ..Default::default()
        };

        let mut risk_counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            if !record.standard_risks.trim().is_empty() {
                summary.funds_with_standard_risks += 1;
            }
            if !record.other_risks.trim().is_empty() {
                summary.funds_with_other_risks += 1;
            }
            for risk in record
                .standard_risks
                .split(FIELD_SEPARATOR.trim())
                .map(str::trim)
                .filter(|r| !r.is_empty())
            {
                *risk_counts.entry(risk).or_default() += 1;
            }

            let row = record.to_row();
            for (column, value) in FundRecord::COLUMNS.iter().zip(row.iter()).skip(1) {
                if value.trim().is_empty() {
                    *summary.blank_counts.entry(column.to_string()).or_default() += 1;
                }
            }

            *summary
                .asset_distribution
                .entry(label(&record.asset_type))
                .or_default() += 1;
            *summary
                .retail_ai_distribution
                .entry(label(&record.retail_ai))
                .or_default() += 1;
        }

        let mut top: Vec<(String, usize)> = risk_counts
            .into_iter()
            .map(|(risk, count)| (risk.to_string(), count))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(TOP_RISKS);
        summary.top_standard_risks = top;

        summary
    }

    /// Emit the summary through tracing, one line per figure
    pub fn log(&self) {
        info!(
            total_funds = self.total_funds,
            with_standard_risks = self.funds_with_standard_risks,
            with_other_risks = self.funds_with_other_risks,
            "Batch summary"
        );
        for (risk, count) in &self.top_standard_risks {
            info!(risk = %risk, funds = count, "Common standard risk");
        }
        for (column, blanks) in &self.blank_counts {
            if CRITICAL_COLUMNS.contains(&column.as_str()) {
                warn!(column = %column, blanks, "Blank critical field");
            } else {
                info!(column = %column, blanks, "Blank field");
            }
        }
        for (asset, count) in &self.asset_distribution {
            info!(asset = %asset, count, "Asset distribution");
        }
        for (status, count) in &self.retail_ai_distribution {
            info!(retail_ai = %status, count, "Retail/AI distribution");
        }
    }
}

fn label(value: &str) -> String {
    if value.trim().is_empty() {
        BLANK_LABEL.to_string()
    } else {
        value.to_string()
    }
}
