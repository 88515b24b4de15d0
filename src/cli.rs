// src/cli.rs
use crate::config::Config;
use crate::filter::DateFilter;
use crate::source::SourceKind;
use clap::Parser;

/// ct-viewer: Certificate Transparency lookup
///
/// Looks up every logged certificate for one or more domains and shows them
/// deduplicated and grouped by issuer.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-viewer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Domains to look up (passed to the source as-is)
    #[arg(required = true, value_name = "DOMAIN")]
    pub domains: Vec<String>,

    // ===== Input & Configuration =====
    /// Path to TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Upstream CT source (overrides config)
    #[arg(long = "source", value_enum)]
    pub source: Option<SourceKind>,

    /// Search API token (overrides config)
    #[arg(long = "api-token")]
    pub api_token: Option<String>,

    /// Cap on crt.sh entries kept per domain (overrides config)
    #[arg(long = "max-entries")]
    pub max_entries: Option<usize>,

    /// Request timeout in seconds (overrides config)
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    // ===== Filtering =====
    /// Only show certificates valid from this date on (YYYY-MM-DD)
    #[arg(long = "since", value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    // ===== Output Format =====
    /// Output reports in JSONL format
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Output one CSV row per log entry
    #[arg(long = "csv")]
    pub csv: bool,

    /// Write output to file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    // ===== Display =====
    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json or --csv"
            );
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.domains.iter().any(|d| d.trim().is_empty()) {
            anyhow::bail!("Please enter a domain name");
        }

        if self.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than 0");
        }

        self.date_filter()?;

        Ok(())
    }

    /// Domains with surrounding whitespace removed
    pub fn trimmed_domains(&self) -> Vec<String> {
        self.domains.iter().map(|d| d.trim().to_string()).collect()
    }

    /// Cutoff filter from `--since`, if given
    pub fn date_filter(&self) -> anyhow::Result<Option<DateFilter>> {
        self.since
            .as_deref()
            .map(DateFilter::from_date_str)
            .transpose()
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Human
        }
    }

    /// Check if progress indicator should be enabled
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.json && !self.csv
    }

    /// Determine log level based on verbose/quiet flags
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    /// Apply CLI overrides on top of file config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }

        if let Some(ref token) = self.api_token {
            config.search_api.api_token = Some(token.clone());
        }

        if let Some(max) = self.max_entries {
            config.crtsh.max_entries = Some(max);
        }

        if let Some(timeout) = self.timeout {
            config.crtsh.timeout_secs = timeout;
            config.search_api.timeout_secs = timeout;
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored tree (default)
    Human,
    /// JSON Lines format (one report per line)
    Json,
    /// CSV format
    Csv,
}
