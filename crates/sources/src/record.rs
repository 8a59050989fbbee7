use serde::{Deserialize, Serialize};

/// One onboarding spreadsheet row. Unknown values are blank, never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    pub no: usize,
    pub fund_house: String,
    pub fund_name: String,
    pub isin: String,
    pub retail_ai: String,
    pub asset_type: String,
    pub geographic: String,
    pub sector: String,
    pub launch_date: String,
    pub annual_management_fee: String,
    pub factsheet: String,
    pub phs_link: String,
    pub investment_objective: String,
    pub standard_risks: String,
    pub other_risks: String,
    pub pspl_risk_classification: String,
}

impl FundRecord {
    /// Spreadsheet headers, in row order
    pub const COLUMNS: [&'static str; 16] = [
        "No.",
        "Fund House",
        "Fund Name",
        "ISIN",
        "Retail/AI",
        "Asset",
        "Geographic",
        "Sector",
        "Launch Date",
        "Annual Management Fee",
        "Factsheet",
        "Highlights (PHS Link)",
        "Investment Objective",
        "Key Risks for Investors",
        "Other Risks",
        "PSPL Risk Classification",
    ];

    /// Row with only the ISIN-derived fields filled in
    pub fn blank(isin: &str, retail_ai: &str, factsheet: String) -> Self {
        Self {
            isin: isin.to_string(),
            retail_ai: retail_ai.to_string(),
            factsheet,
            ..Default::default()
        }
    }

    pub fn to_row(&self) -> [String; 16] {
        [
            self.no.to_string(),
            self.fund_house.clone(),
            self.fund_name.clone(),
            self.isin.clone(),
            self.retail_ai.clone(),
            self.asset_type.clone(),
            self.geographic.clone(),
            self.sector.clone(),
            self.launch_date.clone(),
            self.annual_management_fee.clone(),
            self.factsheet.clone(),
            self.phs_link.clone(),
            self.investment_objective.clone(),
            self.standard_risks.clone(),
            self.other_risks.clone(),
            self.pspl_risk_classification.clone(),
        ]
    }
}

/// "{asset} - {category}" when both are known
pub fn sector(asset_type: &str, morningstar_category: &str) -> String {
    if asset_type.is_empty() || morningstar_category.is_empty() {
        String::new()
    } else {
        format!("{asset_type} - {morningstar_category}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_matches_columns() {
        let record = FundRecord {
            no: 3,
            isin: "LU0123456789".to_string(),
            other_risks: "Odd Thing Risk".to_string(),
            ..Default::default()
        };
        let row = record.to_row();
        assert_eq!(row.len(), FundRecord::COLUMNS.len());
        assert_eq!(row[0], "3");
        assert_eq!(row[3], "LU0123456789");
        assert_eq!(FundRecord::COLUMNS[14], "Other Risks");
        assert_eq!(row[14], "Odd Thing Risk");
    }

    #[test]
    fn test_sector() {
        assert_eq!(sector("Equity Fund", "Global Large-Cap"), "Equity Fund - Global Large-Cap");
        assert_eq!(sector("", "Global Large-Cap"), "");
        assert_eq!(sector("Equity Fund", ""), "");
    }
}
