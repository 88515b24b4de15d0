// src/output/json.rs
//! JSON Lines (JSONL) output handler

use crate::output::{OutputHandler, SharedWriter, lock_writer};
use crate::types::Report;
use async_trait::async_trait;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON Lines output handler
///
/// Outputs one JSON object per domain, one per line (JSONL/NDJSON format)
pub struct JsonOutput {
    writer: SharedWriter,
}

#[derive(Serialize)]
struct FailureLine<'a> {
    domain: &'a str,
    error: &'a str,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Create a new JsonOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::with_writer(Box::new(file))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write_line<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        let mut writer = lock_writer(&self.writer)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit_report(&self, report: &Report) -> anyhow::Result<()> {
        self.write_line(report)
    }

    async fn emit_failure(&self, domain: &str, message: &str) -> anyhow::Result<()> {
        self.write_line(&FailureLine {
            domain,
            error: message,
        })
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        writer.flush()?;
        Ok(())
    }
}
