// src/output/mod.rs
//! Output handling for lookup reports
//!
//! Each handler renders finished [`Report`]s in one format, to stdout or to a
//! file. Handlers never see raw upstream data.

use crate::cli::OutputFormat;
use crate::types::Report;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub mod csv;
pub mod human;
pub mod json;

/// Trait for handlers that present lookup results
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Render one domain's report
    async fn emit_report(&self, report: &Report) -> anyhow::Result<()>;

    /// Render a lookup that failed before producing a report
    async fn emit_failure(&self, domain: &str, message: &str) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Build the handler for a format, writing to `path` when given
pub fn create_handler(format: OutputFormat, path: Option<&Path>) -> anyhow::Result<Box<dyn OutputHandler>> {
    let file = match path {
        Some(p) => Some(File::create(p)?),
        None => None,
    };

    let handler: Box<dyn OutputHandler> = match (format, file) {
        (OutputFormat::Human, Some(f)) => Box::new(human::HumanOutput::to_file(f)),
        (OutputFormat::Human, None) => Box::new(human::HumanOutput::new()),
        (OutputFormat::Json, Some(f)) => Box::new(json::JsonOutput::to_file(f)),
        (OutputFormat::Json, None) => Box::new(json::JsonOutput::new()),
        (OutputFormat::Csv, Some(f)) => Box::new(csv::CsvOutput::to_file(f)),
        (OutputFormat::Csv, None) => Box::new(csv::CsvOutput::new()),
    };

    Ok(handler)
}

pub(crate) type SharedWriter = Mutex<Box<dyn Write + Send>>;

pub(crate) fn lock_writer(writer: &SharedWriter) -> anyhow::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
    writer
        .lock()
        .map_err(|_| anyhow::anyhow!("Output writer lock poisoned"))
}
