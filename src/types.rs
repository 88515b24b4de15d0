// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Deserialize an explicit `null` the same as a missing field
///
/// Pair with `#[serde(default)]` so both spellings of "absent" decode.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which upstream shape a result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceShape {
    /// Flat list keyed by serial number (crt.sh)
    SerialKeyed,
    /// Map of content fingerprint to log entries (CT search API)
    FingerprintGrouped,
}

impl fmt::Display for SourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceShape::SerialKeyed => write!(f, "serial-keyed"),
            SourceShape::FingerprintGrouped => write!(f, "fingerprint-grouped"),
        }
    }
}

/// Structured distinguished name as supplied by the search API
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistinguishedName {
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: Vec<String>,
    /// Full DN string, when the source provides one
    #[serde(default)]
    pub dn: Option<String>,
}

/// Issuer of a certificate, either a DN string or a structured record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuerIdentity {
    Text(String),
    Structured(DistinguishedName),
}

impl IssuerIdentity {
    /// The raw identity as a single string
    pub fn raw(&self) -> String {
        match self {
            IssuerIdentity::Text(s) => s.clone(),
            IssuerIdentity::Structured(dn) => {
                if let Some(full) = dn.dn.as_deref().filter(|s| !s.is_empty()) {
                    return full.to_string();
                }

                let mut parts = Vec::new();
                for c in &dn.country {
                    parts.push(format!("C={}", c));
                }
                for o in &dn.organization {
                    parts.push(format!("O={}", o));
                }
                if let Some(cn) = &dn.common_name {
                    parts.push(format!("CN={}", cn));
                }
                parts.join(", ")
            }
        }
    }
}

impl Default for IssuerIdentity {
    fn default() -> Self {
        IssuerIdentity::Text(String::new())
    }
}

/// Public key summary from the search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub bits: Option<u32>,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// One CT log observation, normalized from either source shape
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    /// Ordering token, lower means logged earlier
    pub sequence: Option<i64>,
    pub issuer: IssuerIdentity,
    pub common_name: Option<String>,
    pub dns_names: Vec<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub serial_number: Option<String>,
    pub fingerprint: Option<String>,
    /// Explicit pre-certificate signal from the source, if it gives one
    pub precert: Option<bool>,
    pub logged_at: Option<String>,
    pub issuer_ca_id: Option<i64>,
    pub log_name: Option<String>,
    pub public_key: Option<PublicKeyInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryLabel {
    #[serde(rename = "Precertificate")]
    Precertificate,
    #[serde(rename = "Leaf Certificate")]
    LeafCertificate,
}

impl fmt::Display for EntryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryLabel::Precertificate => write!(f, "Precertificate"),
            EntryLabel::LeafCertificate => write!(f, "Leaf Certificate"),
        }
    }
}

/// A group member together with its derived label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledEntry {
    pub label: EntryLabel,
    #[serde(flatten)]
    pub record: RawRecord,
}

/// One issued certificate: the pre-certificate and leaf observations share a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateGroup {
    /// Identity key, unique within a result set
    pub key: String,
    pub common_name: Option<String>,
    pub serial_number: Option<String>,
    pub issuer: IssuerIdentity,
    pub dns_names: Vec<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,

    #[serde(skip)]
    pub not_before_time: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub not_after_time: Option<DateTime<Utc>>,

    /// Members, earliest logged first once labeled
    pub entries: Vec<LabeledEntry>,
}

/// Certificates sharing one issuer identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuerGroup {
    pub issuer: IssuerIdentity,
    pub display_name: String,
    pub certificates: Vec<CertificateGroup>,
}

/// Raw records handed over by a fetch collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub shape: SourceShape,
    pub records: Vec<RawRecord>,
    /// Upstream capped the result set
    pub truncated: bool,
}

/// Display-ready lookup result for one domain
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub domain: String,
    pub shape: SourceShape,
    pub cutoff: Option<String>,
    pub truncated: bool,

    /// Post-filter count of certificate groups
    pub total_certificates: usize,

    /// Post-filter count of log entries across all groups
    pub total_entries: usize,

    pub issuers: Vec<IssuerGroup>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} certificates from {} issuers",
            self.domain,
            self.total_certificates,
            self.issuers.len()
        )?;
        if self.truncated {
            write!(f, " (truncated)")?;
        }
        Ok(())
    }
}
