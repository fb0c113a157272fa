//! End-to-end scans over fixed directories.

mod common;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use common::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sp_secret_audit::auth::StaticTokenSupplier;
use sp_secret_audit::diagnostics::NoopDiagnostics;
use sp_secret_audit::scanner::types::{CredentialKind, ServicePrincipal, Severity};
use sp_secret_audit::scanner::{aggregate, scan};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 14, 0, 0).unwrap()
}

fn at(days: i64) -> String {
    (now() + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn three_principals() -> serde_json::Value {
    json!([
        {
            "id": "sp1",
            "appId": "app1",
            "displayName": "Expired SP",
            "passwordCredentials": [{"keyId": "k1", "endDateTime": at(-5)}]
        },
        {
            "id": "sp2",
            "appId": "app2",
            "displayName": "Critical SP",
            "keyCredentials": [{"keyId": "k2", "endDateTime": at(10)}]
        },
        {
            "id": "sp3",
            "appId": "app3",
            "displayName": "Healthy SP",
            "passwordCredentials": [{"keyId": "k3", "endDateTime": at(100)}]
        }
    ])
}

#[test]
fn test_expired_critical_healthy_scenario() {
    let objects: Vec<ServicePrincipal> = serde_json::from_value(three_principals()).unwrap();

    let records = aggregate(&objects, now(), &NoopDiagnostics);

    assert_eq!(records.len(), 3);

    assert_eq!(records[0].sp_name, "Expired SP");
    assert_eq!(records[0].severity, Severity::Expired);
    assert_eq!(records[0].days_remaining, -5);
    assert_eq!(records[0].secret_type, CredentialKind::Password);

    assert_eq!(records[1].sp_name, "Critical SP");
    assert_eq!(records[1].severity, Severity::Critical);
    assert_eq!(records[1].days_remaining, 10);
    assert_eq!(records[1].secret_type, CredentialKind::Certificate);

    assert_eq!(records[2].sp_name, "Healthy SP");
    assert_eq!(records[2].severity, Severity::Healthy);
    assert_eq!(records[2].days_remaining, 100);
}

#[test]
fn test_malformed_entries_are_dropped_quietly() {
    let objects: Vec<ServicePrincipal> = serde_json::from_value(json!([
        {
            "id": "sp1",
            "displayName": "Mixed SP",
            "passwordCredentials": [
                {"keyId": "no-date"},
                {"keyId": "null-date", "endDateTime": null},
                {"keyId": "number-date", "endDateTime": 20250101},
                {"keyId": "bad-date", "endDateTime": "31/12/2025"},
                {"keyId": "good", "endDateTime": at(45)}
            ],
            "keyCredentials": null
        }
    ]))
    .unwrap();

    let diagnostics = RecordingDiagnostics::default();
    let records = aggregate(&objects, now(), &diagnostics);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].secret_id, "good");
    assert_eq!(records[0].severity, Severity::Warning);
    assert_eq!(
        *diagnostics.dropped.lock().unwrap(),
        vec!["no-date", "null-date", "number-date", "bad-date"]
    );
}

#[tokio::test]
async fn test_scan_over_mock_graph() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": three_principals() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), Arc::new(StaticTokenSupplier::new("t")));
    let report = scan(&client, now(), &NoopDiagnostics).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.objects_scanned, 3);
    assert_eq!(report.evaluated_at, now());

    let names: Vec<_> = report.records.iter().map(|r| r.sp_name.as_str()).collect();
    assert_eq!(names, ["Expired SP", "Critical SP", "Healthy SP"]);

    let summary = report.summary();
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.warning, 0);
    assert_eq!(summary.healthy, 1);
}

#[tokio::test]
async fn test_scan_proceeds_on_partial_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_page(
            vec![create_test_sp("sp-1", &at(3))],
            Some(&format!("{}/v1.0/servicePrincipals/next", server.uri())),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals/next"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), Arc::new(StaticTokenSupplier::new("t")));
    let report = scan(&client, now(), &NoopDiagnostics).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.objects_scanned, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].severity, Severity::Critical);
}
