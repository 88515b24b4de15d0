// src/source/search_api.rs
//! CT search API source (log entries pre-grouped by certificate fingerprint)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{CertificateSource, build_http_client, get_body};
use crate::error::LookupError;
use crate::time::parse_timestamp;
use crate::types::{
    null_as_default, DistinguishedName, FetchOutcome, IssuerIdentity, PublicKeyInfo, RawRecord, SourceShape,
};

const SOURCE_NAME: &str = "CT search API";

/// Response from `GET /v1/certificates`
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub truncated: bool,

    /// Log entries keyed by SHA-256 certificate fingerprint
    #[serde(deserialize_with = "merge_fingerprints")]
    pub certificates: BTreeMap<String, Vec<SearchEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    /// "precert" or "cert"
    pub entry_type: Option<String>,
    pub log_name: Option<String>,
    pub logged_at: Option<String>,
    pub serial_number: Option<String>,
    pub subject: Option<Subject>,
    pub issuer: Option<DistinguishedName>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns_names: Vec<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub public_key: Option<PublicKeyInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub common_name: Option<String>,
}

/// Decode the fingerprint map, appending entries when a key repeats
///
/// A repeated key names the same certificate, so its entries belong in one group.
fn merge_fingerprints<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<SearchEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FingerprintMap;

    impl<'de> Visitor<'de> for FingerprintMap {
        type Value = BTreeMap<String, Vec<SearchEntry>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of certificate fingerprints to log entries")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut certificates = BTreeMap::new();

            while let Some((fingerprint, entries)) =
                access.next_entry::<String, Vec<SearchEntry>>()?
            {
                match certificates.entry(fingerprint) {
                    Entry::Vacant(slot) => {
                        slot.insert(entries);
                    }
                    Entry::Occupied(mut slot) => {
                        debug!("Fingerprint {} listed more than once, merging entries", slot.key());
                        slot.get_mut().extend(entries);
                    }
                }
            }

            Ok(certificates)
        }
    }

    deserializer.deserialize_map(FingerprintMap)
}

/// Explicit pre-certificate signal; `None` when the type is unknown
fn precert_signal(entry_type: Option<&str>) -> Option<bool> {
    match entry_type?.to_ascii_lowercase().as_str() {
        "precert" | "precertificate" | "precert_entry" => Some(true),
        "cert" | "certificate" | "leaf" | "x509_entry" => Some(false),
        other => {
            debug!("Unknown entry_type '{}', will infer label", other);
            None
        }
    }
}

impl SearchEntry {
    fn into_record(self, fingerprint: &str) -> RawRecord {
        let sequence = self
            .logged_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|t| t.timestamp_millis());

        RawRecord {
            sequence,
            issuer: IssuerIdentity::Structured(self.issuer.unwrap_or_default()),
            common_name: self.subject.and_then(|s| s.common_name),
            dns_names: self.dns_names,
            not_before: self.not_before,
            not_after: self.not_after,
            serial_number: self.serial_number,
            fingerprint: Some(fingerprint.to_string()),
            precert: precert_signal(self.entry_type.as_deref()),
            logged_at: self.logged_at,
            issuer_ca_id: None,
            log_name: self.log_name,
            public_key: self.public_key,
        }
    }
}

/// Decode a search API body into canonical records plus the truncation flag
///
/// Records come out in fingerprint order, each fingerprint's entries in the
/// order the API listed them.
pub fn parse_response(body: &str) -> Result<(Vec<RawRecord>, bool), LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::decode(SOURCE_NAME, e))?;

    let records: Vec<RawRecord> = response
        .certificates
        .into_iter()
        .flat_map(|(fingerprint, entries)| {
            entries
                .into_iter()
                .map(move |entry| entry.into_record(&fingerprint))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok((records, response.truncated))
}

/// HTTP client for the CT search API
pub struct SearchApiClient {
    endpoint: Url,
    api_token: Option<String>,
    http_client: reqwest::Client,
}

impl SearchApiClient {
    /// Create a new search API client
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/v1/certificates", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid search API base URL: {}", base_url))?;

        if api_token.is_none() {
            warn!("No search API token configured, requests will be unauthenticated");
        }

        Ok(Self {
            endpoint,
            api_token,
            http_client: build_http_client(timeout)?,
        })
    }

    /// Query URL for a domain: `{base}/v1/certificates?domain={domain}`
    pub fn query_url(&self, domain: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("domain", domain);
        url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl CertificateSource for SearchApiClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn shape(&self) -> SourceShape {
        SourceShape::FingerprintGrouped
    }

    async fn fetch(&self, domain: &str) -> Result<FetchOutcome, LookupError> {
        let url = self.query_url(domain);
        info!("Querying CT search API for {}", domain);
        debug!("GET {}", url);

        let mut request = self.http_client.get(url).headers(self.headers());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let body = get_body(SOURCE_NAME, request).await?;
        let (records, truncated) = parse_response(&body)?;

        if truncated {
            warn!("CT search API truncated the result set for {}", domain);
        }
        debug!("Received {} entries from CT search API for {}", records.len(), domain);

        Ok(FetchOutcome {
            shape: SourceShape::FingerprintGrouped,
            records,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "truncated": true,
        "certificates": {
            "bbbb": [
                {
                    "entry_type": "cert",
                    "log_index": 901,
                    "log_name": "Xenon 2024",
                    "logged_at": "2024-01-01T00:05:00Z",
                    "serial_number": "0f",
                    "subject": { "common_name": "example.com" },
                    "issuer": {
                        "common_name": "R3",
                        "organization": ["Let's Encrypt"],
                        "country": ["US"],
                        "dn": "C=US, O=Let's Encrypt, CN=R3"
                    },
                    "dns_names": ["example.com", "www.example.com"],
                    "not_before": "2024-01-01T00:00:00Z",
                    "not_after": "2024-03-31T00:00:00Z",
                    "public_key": { "algorithm": "ECDSA", "bits": 256, "sha256": "cafe" }
                },
                {
                    "entry_type": "precert",
                    "logged_at": "2024-01-01T00:01:00Z",
                    "serial_number": "0f"
                }
            ],
            "aaaa": [
                { "entry_type": "mystery" }
            ]
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let (records, truncated) = parse_response(SAMPLE).unwrap();

        assert!(truncated);
        assert_eq!(records.len(), 3);

        // BTreeMap order: "aaaa" before "bbbb"
        assert_eq!(records[0].fingerprint.as_deref(), Some("aaaa"));
        assert!(records[0].precert.is_none());
        assert!(records[0].sequence.is_none());

        let leaf = &records[1];
        assert_eq!(leaf.fingerprint.as_deref(), Some("bbbb"));
        assert_eq!(leaf.precert, Some(false));
        assert_eq!(leaf.common_name.as_deref(), Some("example.com"));
        assert_eq!(leaf.log_name.as_deref(), Some("Xenon 2024"));
        assert_eq!(leaf.public_key.as_ref().and_then(|k| k.bits), Some(256));
        assert_eq!(leaf.dns_names.len(), 2);
        match &leaf.issuer {
            IssuerIdentity::Structured(dn) => {
                assert_eq!(dn.organization, vec!["Let's Encrypt".to_string()]);
            }
            other => panic!("expected structured issuer, got {:?}", other),
        }

        let precert = &records[2];
        assert_eq!(precert.precert, Some(true));
        assert!(precert.sequence.unwrap() < leaf.sequence.unwrap());
    }

    #[test]
    fn test_missing_issuer_is_empty_structure() {
        let (records, _) =
            parse_response(r#"{"certificates": {"ff": [{}]}}"#).unwrap();

        assert_eq!(
            records[0].issuer,
            IssuerIdentity::Structured(DistinguishedName::default())
        );
    }

    #[test]
    fn test_null_lists_treated_as_empty() {
        let body = r#"{
            "truncated": null,
            "certificates": {
                "ff": [
                    {
                        "entry_type": "cert",
                        "issuer": { "common_name": "R3", "organization": null, "country": null },
                        "dns_names": null
                    }
                ]
            }
        }"#;

        let (records, truncated) = parse_response(body).unwrap();

        assert!(!truncated);
        assert_eq!(records.len(), 1);
        assert!(records[0].dns_names.is_empty());
        match &records[0].issuer {
            IssuerIdentity::Structured(dn) => {
                assert_eq!(dn.common_name.as_deref(), Some("R3"));
                assert!(dn.organization.is_empty());
                assert!(dn.country.is_empty());
            }
            other => panic!("expected structured issuer, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_fingerprint_entries_merged() {
        let body = r#"{
            "certificates": {
                "ff": [ { "entry_type": "precert", "log_name": "Argon 2024" } ],
                "aa": [ { "entry_type": "cert" } ],
                "ff": [ { "entry_type": "cert", "log_name": "Xenon 2024" } ]
            }
        }"#;

        let (records, _) = parse_response(body).unwrap();
        assert_eq!(records.len(), 3);

        let ff: Vec<_> = records
            .iter()
            .filter(|r| r.fingerprint.as_deref() == Some("ff"))
            .map(|r| r.log_name.as_deref())
            .collect();
        assert_eq!(ff, vec![Some("Argon 2024"), Some("Xenon 2024")]);
    }

    #[test]
    fn test_truncated_defaults_false() {
        let (records, truncated) = parse_response(r#"{"certificates": {}}"#).unwrap();
        assert!(records.is_empty());
        assert!(!truncated);
    }

    #[test]
    fn test_missing_certificates_is_decode_error() {
        assert!(matches!(
            parse_response(r#"{"truncated": false}"#),
            Err(LookupError::Decode { .. })
        ));
    }

    #[test]
    fn test_precert_signal() {
        assert_eq!(precert_signal(Some("PRECERT")), Some(true));
        assert_eq!(precert_signal(Some("x509_entry")), Some(false));
        assert_eq!(precert_signal(Some("")), None);
        assert_eq!(precert_signal(None), None);
    }

    #[test]
    fn test_query_url() {
        let client = SearchApiClient::new(
            "https://api.certsearch.example/",
            Some("token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            client.query_url("example.com").as_str(),
            "https://api.certsearch.example/v1/certificates?domain=example.com"
        );
    }
}
