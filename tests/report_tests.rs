use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::TempDir;

use sp_secret_audit::report::{self, ReportFormat};
use sp_secret_audit::scanner::types::{CredentialKind, RiskRecord, Severity};

fn sample_records() -> Vec<RiskRecord> {
    vec![
        RiskRecord {
            sp_name: "Test SP".to_string(),
            app_id: "app-123".to_string(),
            sp_object_id: "obj-123".to_string(),
            secret_id: "key-123".to_string(),
            secret_type: CredentialKind::Password,
            expiry_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            days_remaining: 30,
            severity: Severity::Critical,
        },
        RiskRecord {
            sp_name: "A service principal with a very long display name".to_string(),
            app_id: "app-456".to_string(),
            sp_object_id: "obj-456".to_string(),
            secret_id: "key-456".to_string(),
            secret_type: CredentialKind::Certificate,
            expiry_date: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            days_remaining: 181,
            severity: Severity::Healthy,
        },
    ]
}

#[test]
fn test_export_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.csv");

    report::export(
        path.to_str().unwrap(),
        ReportFormat::Csv,
        &sample_records(),
        Utc::now(),
    )
    .unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Service Principal");
    assert_eq!(&headers[6], "Severity");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Test SP");
    assert_eq!(&rows[0][2], "Password");
    assert_eq!(&rows[0][4], "2025-01-01T00:00:00Z");
    assert_eq!(&rows[0][5], "30");
    assert_eq!(&rows[0][6], "CRITICAL");
}

#[test]
fn test_export_csv_empty_still_has_headers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");

    report::export(path.to_str().unwrap(), ReportFormat::Csv, &[], Utc::now()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("Service Principal,App ID,Secret Type"));
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_export_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");

    report::export(
        path.to_str().unwrap(),
        ReportFormat::Json,
        &sample_records(),
        Utc::now(),
    )
    .unwrap();

    let data: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let rows = data.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Severity"], "CRITICAL");
    assert_eq!(rows[0]["Days Remaining"], 30);
    assert_eq!(rows[1]["Secret Type"], "Certificate");
}

#[test]
fn test_export_markdown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");
    let generated = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

    report::export(
        path.to_str().unwrap(),
        ReportFormat::Markdown,
        &sample_records(),
        generated,
    )
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# Azure Service Principal Secret Expiry Report"));
    assert!(content.contains("Generated on: 2025-01-02 03:04:05 UTC"));
    assert!(content.contains("| Test SP | app-123 | Password | key-123 |"));
    assert!(content.contains("CRITICAL"));
}

#[test]
fn test_table_truncates_names_and_summarizes() {
    let mut out = Vec::new();
    report::write_table(&mut out, &sample_records()).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Service Principal"));
    assert!(text.contains("A service principal with a ver"));
    assert!(!text.contains("very long display name"));
    assert!(text.contains("CRITICAL"));
    assert!(text.contains("TOTAL"));

    let lines: Vec<&str> = text.lines().collect();
    let header = lines.iter().position(|l| l.starts_with("Service Principal")).unwrap();
    assert_eq!(lines[header + 1].len(), lines[header].len());
    assert!(lines[header + 1].chars().all(|c| c == '-'));
}

#[test]
fn test_table_without_records() {
    let mut out = Vec::new();
    report::write_table(&mut out, &[]).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("No risks found"));
}

#[test]
fn test_export_to_missing_directory_fails() {
    let result = report::export(
        "/nonexistent/dir/report.csv",
        ReportFormat::Csv,
        &sample_records(),
        Utc::now(),
    );

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to create output file"));
}
