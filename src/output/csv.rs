// src/output/csv.rs
//! CSV output handler, one row per log entry

use crate::output::OutputHandler;
use crate::types::Report;
use async_trait::async_trait;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;

/// CSV output handler
///
/// Columns repeat the issuer and certificate fields on every entry row so
/// the file can be loaded flat.
pub struct CsvOutput {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    domain: &'a str,
    issuer: String,
    issuer_display_name: &'a str,
    certificate_key: &'a str,
    common_name: Option<&'a str>,
    serial_number: Option<&'a str>,
    not_before: Option<&'a str>,
    not_after: Option<&'a str>,
    dns_names: String,
    label: String,
    sequence: Option<i64>,
    logged_at: Option<&'a str>,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Create a new CsvOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::with_writer(Box::new(file))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(csv::Writer::from_writer(writer)),
        }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, csv::Writer<Box<dyn Write + Send>>>> {
        self.writer
            .lock()
            .map_err(|_| anyhow::anyhow!("CSV writer lock poisoned"))
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_report(&self, report: &Report) -> anyhow::Result<()> {
        let mut writer = self.lock()?;

        for issuer in &report.issuers {
            let issuer_raw = issuer.issuer.raw();

            for cert in &issuer.certificates {
                // Semicolons keep the name list in a single field
                let dns_names = cert.dns_names.join(";");

                for entry in &cert.entries {
                    writer.serialize(CsvRow {
                        domain: &report.domain,
                        issuer: issuer_raw.clone(),
                        issuer_display_name: &issuer.display_name,
                        certificate_key: &cert.key,
                        common_name: cert.common_name.as_deref(),
                        serial_number: cert.serial_number.as_deref(),
                        not_before: cert.not_before.as_deref(),
                        not_after: cert.not_after.as_deref(),
                        dns_names: dns_names.clone(),
                        label: entry.label.to_string(),
                        sequence: entry.record.sequence,
                        logged_at: entry.record.logged_at.as_deref(),
                    })?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    async fn emit_failure(&self, domain: &str, message: &str) -> anyhow::Result<()> {
        // No room for errors in the row format
        error!("{}: {}", domain, message);
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.lock()?;
        writer.flush()?;
        Ok(())
    }
}
