use crate::domain::model::{BillingRecord, BillingRow};
use crate::utils::error::{BillingError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

pub fn render_report(records: &[BillingRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(records
            .iter()
            .map(|r| {
                let amount = r.amount.map(|a| a.to_string()).unwrap_or_default();
                format!("{}\t{}\n", r.period, amount)
            })
            .collect()),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for record in records {
                writer.serialize(BillingRow::from(record))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| BillingError::Io(e.into_error()))?;
            String::from_utf8(bytes).map_err(|e| {
                BillingError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
        }
        OutputFormat::Json => {
            let rows: Vec<BillingRow> = records.iter().map(BillingRow::from).collect();
            let mut json = serde_json::to_string_pretty(&rows)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Writes the rendered report to `path`, or to stdout when `path` is `None`.
pub fn write_report(
    records: &[BillingRecord],
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<()> {
    let rendered = render_report(records, format)?;

    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            tracing::info!("Report saved to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Period;

    fn records() -> Vec<BillingRecord> {
        vec![
            BillingRecord {
                period: Period::new(2020, 8).unwrap(),
                amount: Some(7123),
            },
            BillingRecord {
                period: Period::new(2020, 4).unwrap(),
                amount: None,
            },
        ]
    }

    #[test]
    fn test_text_report() {
        let out = render_report(&records(), OutputFormat::Text).unwrap();
        assert_eq!(out, "2020-08\t7123\n2020-04\t\n");
    }

    #[test]
    fn test_csv_report() {
        let out = render_report(&records(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "period,year,month,amount");
        assert_eq!(lines[1], "2020-08,2020,8,7123");
        assert_eq!(lines[2], "2020-04,2020,4,");
    }

    #[test]
    fn test_json_report() {
        let out = render_report(&records(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["period"], "2020-08");
        assert_eq!(value[0]["amount"], 7123);
        assert!(value[1]["amount"].is_null());
    }
}
