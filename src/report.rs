//! Report renderers for ranked risk records.
//!
//! Every renderer reads the records in the order the aggregator produced
//! them and writes to any [`Write`] sink.
//!
//! | Format | Output |
//! |---|---|
//! | `table` | Fixed-width console table with a severity summary |
//! | `csv` | One row per credential |
//! | `json` | Array of row objects |
//! | `markdown` | Titled document with a pipe table |

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::scanner::types::{RiskRecord, Severity};
use crate::scanner::SeveritySummary;
use crate::utils::format::{format_number, truncate_display};
use crate::utils::time::format_timestamp;

/// Console column width for service principal names.
const NAME_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
    Markdown,
}

impl ReportFormat {
    /// Format for a file written to `path`.
    ///
    /// An explicit non-table format always wins. Otherwise the extension
    /// decides, and unknown extensions fall back to CSV. The flag is true
    /// when that fallback was taken.
    pub fn for_output_file(requested: Self, path: &str) -> (Self, bool) {
        if requested != Self::Table {
            return (requested, false);
        }

        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => (Self::Csv, false),
            Some("json") => (Self::Json, false),
            Some("md") | Some("markdown") => (Self::Markdown, false),
            _ => (Self::Csv, true),
        }
    }
}

/// One output row, shared by CSV, JSON and Markdown.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Service Principal")]
    sp_name: &'a str,
    #[serde(rename = "App ID")]
    app_id: &'a str,
    #[serde(rename = "Secret Type")]
    secret_type: &'static str,
    #[serde(rename = "Key ID")]
    secret_id: &'a str,
    #[serde(rename = "Expiry Date")]
    expiry_date: String,
    #[serde(rename = "Days Remaining")]
    days_remaining: i64,
    #[serde(rename = "Severity")]
    severity: Severity,
}

const COLUMNS: [&str; 7] = [
    "Service Principal",
    "App ID",
    "Secret Type",
    "Key ID",
    "Expiry Date",
    "Days Remaining",
    "Severity",
];

impl<'a> From<&'a RiskRecord> for ReportRow<'a> {
    fn from(record: &'a RiskRecord) -> Self {
        Self {
            sp_name: &record.sp_name,
            app_id: &record.app_id,
            secret_type: record.secret_type.as_str(),
            secret_id: &record.secret_id,
            expiry_date: record
                .expiry_date
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            days_remaining: record.days_remaining,
            severity: record.severity,
        }
    }
}

/// Console table followed by per-severity counts.
pub fn write_table<W: Write>(out: &mut W, records: &[RiskRecord]) -> Result<()> {
    if records.is_empty() {
        writeln!(out, "\nNo risks found matching criteria.")?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<30}  {:<36}  {:<11}  {:>9}  {:<8}",
        "Service Principal", "App ID", "Type", "Days Left", "Severity"
    )?;
    writeln!(out, "{}", "-".repeat(102))?;

    for record in records {
        writeln!(
            out,
            "{:<30}  {:<36}  {:<11}  {:>9}  {:<8}",
            truncate_display(&record.sp_name, NAME_WIDTH),
            record.app_id,
            record.secret_type.as_str(),
            record.days_remaining,
            record.severity.as_str()
        )?;
    }

    let summary = SeveritySummary::from_records(records);
    writeln!(out)?;
    for severity in Severity::ALL {
        writeln!(
            out,
            "  {:<9} {:>8}",
            severity.as_str(),
            format_number(summary.count(severity))
        )?;
    }
    writeln!(out, "  {:<9} {:>8}", "TOTAL", format_number(summary.total()))?;

    Ok(())
}

pub fn write_csv<W: Write>(out: W, records: &[RiskRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if records.is_empty() {
        // serialize() only emits headers alongside the first row
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(ReportRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut out: W, records: &[RiskRecord]) -> Result<()> {
    let rows: Vec<ReportRow<'_>> = records.iter().map(ReportRow::from).collect();
    serde_json::to_writer_pretty(&mut out, &rows).context("Failed to serialize report to JSON")?;
    writeln!(out)?;
    Ok(())
}

pub fn write_markdown<W: Write>(
    out: &mut W,
    records: &[RiskRecord],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    writeln!(out, "# Azure Service Principal Secret Expiry Report\n")?;
    writeln!(out, "Generated on: {}\n", format_timestamp(&generated_at))?;

    writeln!(out, "| {} |", COLUMNS.join(" | "))?;
    writeln!(out, "|{}", "---|".repeat(COLUMNS.len()))?;
    for record in records {
        let row = ReportRow::from(record);
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            escape_markdown(row.sp_name),
            escape_markdown(row.app_id),
            row.secret_type,
            escape_markdown(row.secret_id),
            row.expiry_date,
            row.days_remaining,
            row.severity
        )?;
    }

    Ok(())
}

fn escape_markdown(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Write `records` to `path` in `format`.
pub fn export(
    path: &str,
    format: ReportFormat,
    records: &[RiskRecord],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create output file: {}", path))?;
    let mut writer = BufWriter::new(file);

    match format {
        ReportFormat::Csv => write_csv(&mut writer, records),
        ReportFormat::Json => write_json(&mut writer, records),
        ReportFormat::Markdown => write_markdown(&mut writer, records, generated_at),
        ReportFormat::Table => write_table(&mut writer, records),
    }
    .with_context(|| format!("Failed to write report to: {}", path))?;

    writer
        .flush()
        .with_context(|| format!("Failed to flush report to: {}", path))?;
    Ok(())
}
