// src/pipeline.rs
//! Per-domain lookup: fetch, group, filter, aggregate

use crate::error::LookupError;
use crate::filter::DateFilter;
use crate::grouping::group_records;
use crate::issuer::aggregate_by_issuer;
use crate::source::CertificateSource;
use crate::types::{FetchOutcome, Report};
use tracing::{debug, info};

/// Turn a fetched result set into a display-ready report
///
/// Pure: no I/O and no shared state, so it is safe to run for any number of
/// domains at once. Counts in the report are taken after filtering.
pub fn build_report(domain: &str, outcome: FetchOutcome, filter: Option<&DateFilter>) -> Report {
    let fetched = outcome.records.len();
    let mut groups = group_records(outcome.shape, outcome.records);

    if let Some(filter) = filter {
        let before = groups.len();
        groups = filter.filter_groups(groups);
        debug!(
            "Cutoff {} removed {} of {} certificates for {}",
            filter.cutoff().format("%Y-%m-%d"),
            before - groups.len(),
            before,
            domain
        );
    }

    let total_certificates = groups.len();
    let total_entries = groups.iter().map(|g| g.entries.len()).sum();
    let issuers = aggregate_by_issuer(groups);

    info!(
        "{}: {} log entries, {} certificates, {} issuers",
        domain,
        fetched,
        total_certificates,
        issuers.len()
    );

    Report {
        domain: domain.to_string(),
        shape: outcome.shape,
        cutoff: filter.map(|f| f.cutoff().format("%Y-%m-%d").to_string()),
        truncated: outcome.truncated,
        total_certificates,
        total_entries,
        issuers,
    }
}

/// Fetch a domain's certificates and build its report
///
/// Fetch and decode failures abort before any grouping.
pub async fn lookup(
    source: &dyn CertificateSource,
    domain: &str,
    filter: Option<&DateFilter>,
) -> Result<Report, LookupError> {
    let outcome = source.fetch(domain).await?;
    Ok(build_report(domain, outcome, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryLabel, IssuerIdentity, RawRecord, SourceShape};
    use async_trait::async_trait;

    fn crtsh(id: i64, serial: &str, issuer: &str, not_before: &str, not_after: &str) -> RawRecord {
        RawRecord {
            sequence: Some(id),
            serial_number: Some(serial.to_string()),
            issuer: IssuerIdentity::Text(issuer.to_string()),
            common_name: Some("example.com".to_string()),
            not_before: Some(not_before.to_string()),
            not_after: Some(not_after.to_string()),
            ..Default::default()
        }
    }

    fn outcome(records: Vec<RawRecord>) -> FetchOutcome {
        FetchOutcome {
            shape: SourceShape::SerialKeyed,
            records,
            truncated: false,
        }
    }

    const LE: &str = "C=US, O=Let's Encrypt, CN=R3";
    const DC: &str = "C=US, O=DigiCert Inc, CN=DigiCert TLS RSA SHA256 2020 CA1";

    #[test]
    fn test_precert_leaf_pair_end_to_end() {
        let report = build_report(
            "example.com",
            outcome(vec![
                crtsh(9, "ABC123", LE, "2024-01-01T00:00:00", "2024-03-31T00:00:00"),
                crtsh(5, "ABC123", LE, "2024-01-01T00:00:00", "2024-03-31T00:00:00"),
            ]),
            None,
        );

        assert_eq!(report.total_certificates, 1);
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.issuers.len(), 1);

        let issuer = &report.issuers[0];
        assert_eq!(issuer.display_name, "Let's Encrypt (R3)");

        let cert = &issuer.certificates[0];
        assert_eq!(cert.entries[0].record.sequence, Some(5));
        assert_eq!(cert.entries[0].label, EntryLabel::Precertificate);
        assert_eq!(cert.entries[1].record.sequence, Some(9));
        assert_eq!(cert.entries[1].label, EntryLabel::LeafCertificate);
    }

    #[test]
    fn test_counts_are_post_filter() {
        let filter = DateFilter::from_date_str("2024-01-01").unwrap();
        let report = build_report(
            "example.com",
            outcome(vec![
                crtsh(1, "OLD", DC, "2023-12-31T00:00:00", "2024-12-31T00:00:00"),
                crtsh(2, "OLD", DC, "2023-12-31T00:00:00", "2024-12-31T00:00:00"),
                crtsh(3, "NEW", LE, "2024-01-01T00:00:00", "2024-03-31T00:00:00"),
            ]),
            Some(&filter),
        );

        assert_eq!(report.total_certificates, 1);
        assert_eq!(report.total_entries, 1);
        assert_eq!(report.issuers.len(), 1);
        assert_eq!(report.issuers[0].display_name, "Let's Encrypt (R3)");
        assert_eq!(report.cutoff.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_truncation_propagated() {
        let mut fetched = outcome(Vec::new());
        fetched.truncated = true;

        let report = build_report("example.com", fetched, None);

        assert!(report.truncated);
        assert_eq!(report.total_certificates, 0);
        assert!(report.issuers.is_empty());
    }

    #[test]
    fn test_issuers_sorted_and_certs_by_expiry() {
        let report = build_report(
            "example.com",
            outcome(vec![
                crtsh(1, "A", LE, "2024-01-01T00:00:00", "2024-03-31T00:00:00"),
                crtsh(2, "B", DC, "2024-01-01T00:00:00", "2025-01-01T00:00:00"),
                crtsh(3, "C", LE, "2024-04-01T00:00:00", "2024-06-30T00:00:00"),
            ]),
            None,
        );

        let names: Vec<_> = report.issuers.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["DigiCert Inc (DigiCert TLS RSA SHA256 2020 CA1)", "Let's Encrypt (R3)"]
        );

        let le_keys: Vec<_> = report.issuers[1]
            .certificates
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(le_keys, vec!["C", "A"]);
    }

    struct FailingSource;

    #[async_trait]
    impl CertificateSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn shape(&self) -> SourceShape {
            SourceShape::SerialKeyed
        }

        async fn fetch(&self, _domain: &str) -> Result<FetchOutcome, LookupError> {
            Err(LookupError::Status {
                source_name: "failing".to_string(),
                status: 503,
            })
        }
    }

    #[tokio::test]
    async fn test_lookup_propagates_fetch_error() {
        let result = lookup(&FailingSource, "example.com", None).await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "failing returned status: 503");
    }

    struct StaticSource(Vec<RawRecord>);

    #[async_trait]
    impl CertificateSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn shape(&self) -> SourceShape {
            SourceShape::SerialKeyed
        }

        async fn fetch(&self, _domain: &str) -> Result<FetchOutcome, LookupError> {
            Ok(outcome(self.0.clone()))
        }
    }

    #[test]
    fn test_lookup_blocking() {
        let source = StaticSource(vec![crtsh(
            1,
            "A",
            LE,
            "2024-01-01T00:00:00",
            "2024-03-31T00:00:00",
        )]);

        let report = tokio_test::block_on(lookup(&source, "example.com", None)).unwrap();
        assert_eq!(report.domain, "example.com");
        assert_eq!(report.total_certificates, 1);
    }
}
