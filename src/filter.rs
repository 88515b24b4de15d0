// src/filter.rs
//! Validity-start cutoff filtering

use crate::time::{parse_cutoff, parse_timestamp};
use crate::types::{CertificateGroup, IssuerGroup, RawRecord};
use chrono::{DateTime, Utc};

/// Drops certificates whose validity starts before a cutoff
///
/// The boundary is inclusive. Anything whose start date cannot be parsed is
/// kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    cutoff: DateTime<Utc>,
}

impl DateFilter {
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// Create a filter from a `YYYY-MM-DD` date
    pub fn from_date_str(date: &str) -> anyhow::Result<Self> {
        match parse_cutoff(date) {
            Some(cutoff) => Ok(Self::new(cutoff)),
            None => anyhow::bail!("Invalid cutoff date '{}': expected YYYY-MM-DD", date),
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Check if an element with this validity start should be kept
    pub fn should_keep(&self, not_before: Option<&DateTime<Utc>>) -> bool {
        match not_before {
            Some(start) => *start >= self.cutoff,
            None => true,
        }
    }

    /// Filter a flat record list by each record's own `not_before`
    pub fn filter_records(&self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        records
            .into_iter()
            .filter(|r| {
                let start = r.not_before.as_deref().and_then(parse_timestamp);
                self.should_keep(start.as_ref())
            })
            .collect()
    }

    /// Filter certificate groups by the group's representative validity start
    pub fn filter_groups(&self, groups: Vec<CertificateGroup>) -> Vec<CertificateGroup> {
        groups
            .into_iter()
            .filter(|g| self.should_keep(g.not_before_time.as_ref()))
            .collect()
    }

    /// Filter issuer groups, dropping issuers left with no certificates
    pub fn filter_issuers(&self, issuers: Vec<IssuerGroup>) -> Vec<IssuerGroup> {
        issuers
            .into_iter()
            .filter_map(|mut issuer| {
                issuer.certificates = self.filter_groups(issuer.certificates);
                if issuer.certificates.is_empty() {
                    None
                } else {
                    Some(issuer)
                }
            })
            .collect()
    }
}
