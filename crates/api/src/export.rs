use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use sources::FundRecord;

/// "Aug 28_Mass Onboarding Retail Funds.csv"
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("{}_Mass Onboarding Retail Funds.csv", date.format("%b %d"))
}

pub fn write_records<W: Write>(writer: W, records: &[FundRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FundRecord::COLUMNS)?;
    for record in records {
        csv.write_record(record.to_row())?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the batch to `dir`, creating it if needed
pub fn export_csv(dir: &Path, records: &[FundRecord], date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output folder {}", dir.display()))?;

    let path = dir.join(csv_file_name(date));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_records(file, records)?;

    info!(path = %path.display(), rows = records.len(), "Exported fund data");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 28).unwrap();
        assert_eq!(csv_file_name(date), "Aug 28_Mass Onboarding Retail Funds.csv");
        let date = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        assert_eq!(csv_file_name(date), "Sep 03_Mass Onboarding Retail Funds.csv");
    }

    #[test]
    fn test_headers_and_quoting() {
        let record = FundRecord {
            no: 1,
            isin: "LU0123456789".to_string(),
            standard_risks: "Credit Risk; Market Risk".to_string(),
            investment_objective: "Grow capital, \"long term\"".to_string(),
            ..Default::default()
        };

        let mut out = Vec::new();
        write_records(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "No.,Fund House,Fund Name,ISIN,Retail/AI,Asset,Geographic,Sector,Launch Date,\
             Annual Management Fee,Factsheet,Highlights (PHS Link),Investment Objective,\
             Key Risks for Investors,Other Risks,PSPL Risk Classification"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,,,LU0123456789,"));
        assert!(row.contains(r#""Grow capital, ""long term""""#));
        assert!(row.contains("Credit Risk; Market Risk"));
    }

    #[test]
    fn test_export_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("results");
        let date = NaiveDate::from_ymd_opt(2024, 8, 28).unwrap();

        let path = export_csv(&out_dir, &[], date).unwrap();
        assert!(path.ends_with("Aug 28_Mass Onboarding Retail Funds.csv"));
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
