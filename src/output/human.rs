// src/output/human.rs
//! Human-readable colored terminal output

use crate::output::{OutputHandler, SharedWriter, lock_writer};
use crate::time::format_instant;
use crate::types::{CertificateGroup, LabeledEntry, Report, SourceShape, EntryLabel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable output handler, one indented tree per domain
pub struct HumanOutput {
    writer: SharedWriter,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Create a new HumanOutput that writes to a file
    pub fn to_file(file: std::fs::File) -> Self {
        Self::with_writer(Box::new(file), false) // No colors when writing to file
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, use_colors: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors,
        }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render a report as an issuer / certificate / entry tree
    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();

        let count = plural(report.total_certificates, "certificate");
        let issuers = plural(report.issuers.len(), "issuer");
        let _ = write!(
            out,
            "{} {} from {}",
            self.paint(&report.domain, |s| s.cyan().bold()),
            count,
            issuers
        );
        if let Some(cutoff) = &report.cutoff {
            let _ = write!(out, " issued on or after {}", cutoff);
        }
        out.push('\n');

        if report.truncated {
            let _ = writeln!(
                out,
                "{}",
                self.paint(
                    "  Results were truncated by the source; some certificates may be missing.",
                    |s| s.yellow()
                )
            );
        }

        if report.issuers.is_empty() {
            let _ = writeln!(out, "  No certificates found.");
            return out;
        }

        for issuer in &report.issuers {
            out.push('\n');
            let _ = writeln!(
                out,
                "{}  {}",
                self.paint(&issuer.display_name, |s| s.bold()),
                self.paint(&format!("[{}]", plural(issuer.certificates.len(), "certificate")), |s| s.dimmed())
            );

            for cert in &issuer.certificates {
                self.render_certificate(&mut out, report.shape, cert);
            }
        }

        out
    }

    fn render_certificate(&self, out: &mut String, shape: SourceShape, cert: &CertificateGroup) {
        let name = cert.common_name.as_deref().unwrap_or("(no common name)");
        let _ = writeln!(out, "  {}", self.paint(name, |s| s.green()));

        match shape {
            SourceShape::SerialKeyed => {
                let serial = cert.serial_number.as_deref().unwrap_or("-");
                let _ = writeln!(out, "    {} {}", self.paint("Serial:     ", |s| s.dimmed()), serial);
            }
            SourceShape::FingerprintGrouped => {
                let _ = writeln!(out, "    {} {}", self.paint("Fingerprint:", |s| s.dimmed()), cert.key);
                if let Some(serial) = &cert.serial_number {
                    let _ = writeln!(out, "    {} {}", self.paint("Serial:     ", |s| s.dimmed()), serial);
                }
            }
        }

        let _ = writeln!(
            out,
            "    {} {} to {}",
            self.paint("Valid:      ", |s| s.dimmed()),
            show_date(cert.not_before_time.as_ref(), cert.not_before.as_deref()),
            show_date(cert.not_after_time.as_ref(), cert.not_after.as_deref())
        );

        if !cert.dns_names.is_empty() {
            let _ = writeln!(
                out,
                "    {} {}",
                self.paint("Names:      ", |s| s.dimmed()),
                cert.dns_names.join(", ")
            );
        }

        if let Some(key) = cert.entries.iter().find_map(|e| e.record.public_key.as_ref()) {
            let algorithm = key.algorithm.as_deref().unwrap_or("unknown");
            let desc = match key.bits {
                Some(bits) => format!("{} {}", algorithm, bits),
                None => algorithm.to_string(),
            };
            let _ = writeln!(out, "    {} {}", self.paint("Key:        ", |s| s.dimmed()), desc);
        }

        for entry in &cert.entries {
            self.render_entry(out, entry);
        }
    }

    fn render_entry(&self, out: &mut String, entry: &LabeledEntry) {
        let label = format!("{:<16}", entry.label.to_string());
        let label = match entry.label {
            EntryLabel::Precertificate => self.paint(&label, |s| s.yellow()),
            EntryLabel::LeafCertificate => self.paint(&label, |s| s.blue()),
        };

        let _ = write!(out, "      {}", label);
        if let Some(seq) = entry.record.sequence {
            if entry.record.log_name.is_none() {
                let _ = write!(out, " #{}", seq);
            }
        }
        if let Some(log) = &entry.record.log_name {
            let _ = write!(out, " {}", log);
        }
        if let Some(logged_at) = &entry.record.logged_at {
            let _ = write!(out, " logged {}", logged_at);
        }
        out.push('\n');
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Parsed date if available, else the raw upstream string
fn show_date(parsed: Option<&DateTime<Utc>>, raw: Option<&str>) -> String {
    match (parsed, raw) {
        (Some(dt), _) => format_instant(dt),
        (None, Some(raw)) => raw.to_string(),
        (None, None) => "?".to_string(),
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit_report(&self, report: &Report) -> anyhow::Result<()> {
        let rendered = self.render(report);
        let mut writer = lock_writer(&self.writer)?;
        writeln!(writer, "{}", rendered)?;
        writer.flush()?;
        Ok(())
    }

    async fn emit_failure(&self, domain: &str, message: &str) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        writeln!(
            writer,
            "{} {}\n",
            self.paint(domain, |s| s.cyan().bold()),
            self.paint(&format!("Error: {}", message), |s| s.red())
        )?;
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        writer.flush()?;
        Ok(())
    }
}
