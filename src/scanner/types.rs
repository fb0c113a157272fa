//! Data structures for directory objects and the risk records built from them.
//!
//! [`ServicePrincipal`] mirrors the subset of the Microsoft Graph
//! `servicePrincipal` resource selected by the fetcher. Every field is
//! optional and mistyped values decode as absent, so shape drift in one
//! object never fails a whole page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder used when the directory omits an identity field.
pub const UNKNOWN: &str = "Unknown";

/// A service principal as returned by `GET /servicePrincipals?$select=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub app_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub display_name: Option<String>,
    /// Client secrets
    #[serde(default, deserialize_with = "deserialize_credential_list")]
    pub password_credentials: Vec<CredentialPayload>,
    /// Certificates
    #[serde(default, deserialize_with = "deserialize_credential_list")]
    pub key_credentials: Vec<CredentialPayload>,
}

impl ServicePrincipal {
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn app_id_or_unknown(&self) -> &str {
        self.app_id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn display_name_or_unknown(&self) -> &str {
        self.display_name.as_deref().unwrap_or(UNKNOWN)
    }
}

/// One entry of `passwordCredentials` or `keyCredentials`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub key_id: Option<String>,
    /// Raw ISO 8601 expiry. Non-string values are treated as absent.
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub end_date_time: Option<String>,
}

/// Accepts an array of credentials; anything else is an empty list.
///
/// Entries that are not objects keep their slot as a payload with no key id
/// and no expiry, so they are dropped later like any other unusable entry.
fn deserialize_credential_list<'de, D>(
    deserializer: D,
) -> Result<Vec<CredentialPayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };

    Ok(entries
        .into_iter()
        .map(|entry| CredentialPayload::deserialize(entry).unwrap_or_default())
        .collect())
}

/// Accepts a string, or yields `None` for null, numbers, objects and arrays.
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Credential family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    Password,
    Certificate,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "Password",
            Self::Certificate => "Certificate",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential discovered on a directory object, before its expiry is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialEntry<'a> {
    pub key_id: Option<&'a str>,
    pub kind: CredentialKind,
    pub raw_expiry: Option<&'a str>,
}

/// Urgency of a credential, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Expired,
    Critical,
    Warning,
    Healthy,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Expired,
        Severity::Critical,
        Severity::Warning,
        Severity::Healthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "EXPIRED",
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Healthy => "HEALTHY",
        }
    }

    /// Expired or due within the critical window.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Expired | Self::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiry risk of a single credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub sp_name: String,
    pub app_id: String,
    pub sp_object_id: String,
    pub secret_id: String,
    pub secret_type: CredentialKind,
    pub expiry_date: DateTime<Utc>,
    pub days_remaining: i64,
    pub severity: Severity,
}
