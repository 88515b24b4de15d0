// src/issuer.rs
//! Issuer display names and grouping of certificates by issuer

use crate::types::{CertificateGroup, DistinguishedName, IssuerGroup, IssuerIdentity};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const UNKNOWN_ISSUER: &str = "Unknown Issuer";

/// Short human-readable label for an issuer
///
/// "C=US, O=Let's Encrypt, CN=R3" becomes "Let's Encrypt (R3)". Falls back to
/// whichever of organization and common name is present, then to the raw
/// identity.
pub fn display_name(issuer: &IssuerIdentity) -> String {
    match issuer {
        IssuerIdentity::Text(dn) => display_name_from_str(dn),
        IssuerIdentity::Structured(dn) => display_name_from_dn(dn),
    }
}

fn display_name_from_str(issuer: &str) -> String {
    let mut org = None;
    let mut cn = None;

    for part in issuer.split(", ").map(str::trim) {
        if let Some(value) = part.strip_prefix("O=") {
            org = Some(value);
        } else if let Some(value) = part.strip_prefix("CN=") {
            cn = Some(value);
        }
    }

    format_name(org, cn).unwrap_or_else(|| issuer.to_string())
}

fn display_name_from_dn(dn: &DistinguishedName) -> String {
    let org = dn.organization.first().map(String::as_str);
    let cn = dn.common_name.as_deref();

    format_name(org, cn)
        .or_else(|| dn.dn.clone().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| UNKNOWN_ISSUER.to_string())
}

fn format_name(org: Option<&str>, cn: Option<&str>) -> Option<String> {
    let org = org.filter(|s| !s.is_empty());
    let cn = cn.filter(|s| !s.is_empty());

    match (org, cn) {
        (Some(org), Some(cn)) => Some(format!("{} ({})", org, cn)),
        (Some(org), None) => Some(org.to_string()),
        (None, Some(cn)) => Some(cn.to_string()),
        (None, None) => None,
    }
}

/// Order display names alphabetically, ignoring case
///
/// Ties on the case-folded form fall back to the raw strings so the order is
/// total.
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Newest expiration first; unparseable expirations go last
fn compare_expiry(a: &CertificateGroup, b: &CertificateGroup) -> Ordering {
    match (&a.not_after_time, &b.not_after_time) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Group certificates by full issuer identity and impose display order
///
/// Issuers whose display names collide stay separate. Within an issuer,
/// certificates are sorted by expiration, newest first; equal instants keep
/// their input order. Issuers are sorted by display name.
pub fn aggregate_by_issuer(groups: Vec<CertificateGroup>) -> Vec<IssuerGroup> {
    let mut index: HashMap<IssuerIdentity, usize> = HashMap::new();
    let mut issuers: Vec<IssuerGroup> = Vec::new();

    for group in groups {
        if let Some(&pos) = index.get(&group.issuer) {
            issuers[pos].certificates.push(group);
        } else {
            index.insert(group.issuer.clone(), issuers.len());
            issuers.push(IssuerGroup {
                issuer: group.issuer.clone(),
                display_name: display_name(&group.issuer),
                certificates: vec![group],
            });
        }
    }

    for issuer in &mut issuers {
        issuer.certificates.sort_by(compare_expiry);
    }

    issuers.sort_by(|a, b| compare_display_names(&a.display_name, &b.display_name));

    issuers
}
