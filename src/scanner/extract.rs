//! Credential discovery on a single directory object.

use super::types::{CredentialEntry, CredentialKind, CredentialPayload, ServicePrincipal};

/// Every credential on `sp`: passwords first, then certificates, each in
/// payload order.
///
/// Entries without an expiry are still yielded; dropping them is the
/// aggregator's decision.
pub fn extract(sp: &ServicePrincipal) -> Vec<CredentialEntry<'_>> {
    let passwords = sp
        .password_credentials
        .iter()
        .map(|payload| entry(payload, CredentialKind::Password));
    let certificates = sp
        .key_credentials
        .iter()
        .map(|payload| entry(payload, CredentialKind::Certificate));

    passwords.chain(certificates).collect()
}

fn entry(payload: &CredentialPayload, kind: CredentialKind) -> CredentialEntry<'_> {
    CredentialEntry {
        key_id: payload.key_id.as_deref(),
        kind,
        raw_expiry: payload.end_date_time.as_deref(),
    }
}
