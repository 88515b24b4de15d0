// src/source/crtsh.rs
//! crt.sh JSON source (flat records keyed by serial number)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{CertificateSource, build_http_client, get_body};
use crate::error::LookupError;
use crate::types::{FetchOutcome, IssuerIdentity, RawRecord, SourceShape};

const SOURCE_NAME: &str = "crt.sh";

/// One row of crt.sh's `output=json` response
#[derive(Debug, Clone, Deserialize)]
pub struct CrtShEntry {
    pub id: Option<i64>,
    pub issuer_ca_id: Option<i64>,
    pub issuer_name: Option<String>,
    pub common_name: Option<String>,

    /// Newline-separated SAN DNS names
    pub name_value: Option<String>,

    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub serial_number: Option<String>,
    pub entry_timestamp: Option<String>,
}

impl From<CrtShEntry> for RawRecord {
    fn from(entry: CrtShEntry) -> Self {
        let mut dns_names: Vec<String> = Vec::new();
        for name in entry.name_value.as_deref().unwrap_or_default().lines() {
            let name = name.trim();
            if !name.is_empty() && !dns_names.iter().any(|n| n == name) {
                dns_names.push(name.to_string());
            }
        }

        RawRecord {
            sequence: entry.id,
            issuer: IssuerIdentity::Text(entry.issuer_name.unwrap_or_default()),
            common_name: entry.common_name,
            dns_names,
            not_before: entry.not_before,
            not_after: entry.not_after,
            serial_number: entry.serial_number,
            fingerprint: None,
            precert: None,
            logged_at: entry.entry_timestamp,
            issuer_ca_id: entry.issuer_ca_id,
            log_name: None,
            public_key: None,
        }
    }
}

/// Decode a crt.sh response body into canonical records
pub fn parse_response(body: &str) -> Result<Vec<RawRecord>, LookupError> {
    let entries: Vec<CrtShEntry> =
        serde_json::from_str(body).map_err(|e| LookupError::decode(SOURCE_NAME, e))?;
    Ok(entries.into_iter().map(RawRecord::from).collect())
}

/// HTTP client for crt.sh
pub struct CrtShClient {
    endpoint: Url,
    http_client: reqwest::Client,
    max_entries: Option<usize>,
}

impl CrtShClient {
    /// Create a new crt.sh client
    ///
    /// `max_entries` caps the result set; a capped result is flagged truncated.
    pub fn new(base_url: &str, timeout: Duration, max_entries: Option<usize>) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid crt.sh base URL: {}", base_url))?;

        Ok(Self {
            endpoint,
            http_client: build_http_client(timeout)?,
            max_entries,
        })
    }

    /// Query URL for a domain: `{base}/?q={domain}&output=json`
    pub fn query_url(&self, domain: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", domain)
            .append_pair("output", "json");
        url
    }
}

#[async_trait]
impl CertificateSource for CrtShClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn shape(&self) -> SourceShape {
        SourceShape::SerialKeyed
    }

    async fn fetch(&self, domain: &str) -> Result<FetchOutcome, LookupError> {
        let url = self.query_url(domain);
        info!("Querying crt.sh for {}", domain);
        debug!("GET {}", url);

        let body = get_body(SOURCE_NAME, self.http_client.get(url)).await?;
        let mut records = parse_response(&body)?;

        let mut truncated = false;
        if let Some(max) = self.max_entries {
            if records.len() > max {
                warn!(
                    "crt.sh returned {} entries for {}, keeping the first {}",
                    records.len(),
                    domain,
                    max
                );
                records.truncate(max);
                truncated = true;
            }
        }

        debug!("Received {} entries from crt.sh for {}", records.len(), domain);

        Ok(FetchOutcome {
            shape: SourceShape::SerialKeyed,
            records,
            truncated,
        })
    }
}
