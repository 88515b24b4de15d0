// src/source/mod.rs
//! Upstream CT data sources
//!
//! Each source fetches one domain's result set over HTTP and adapts its
//! response shape into canonical [`RawRecord`](crate::types::RawRecord)s, so
//! grouping, filtering and aggregation never see the upstream format.

use crate::config::Config;
use crate::error::LookupError;
use crate::types::{FetchOutcome, SourceShape};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub mod crtsh;
pub mod search_api;

pub use crtsh::CrtShClient;
pub use search_api::SearchApiClient;

/// A fetch collaborator for one upstream CT source
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Source name used in logs and error messages
    fn name(&self) -> &str;

    /// Shape of the records this source produces
    fn shape(&self) -> SourceShape;

    /// Fetch every logged certificate for a domain
    async fn fetch(&self, domain: &str) -> Result<FetchOutcome, LookupError>;
}

/// Selectable upstream source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// crt.sh JSON, keyed by serial number
    #[default]
    Crtsh,
    /// CT search API, keyed by certificate fingerprint
    SearchApi,
}

/// Build the source selected in config
pub fn from_config(config: &Config) -> Result<Box<dyn CertificateSource>> {
    match config.source.kind {
        SourceKind::Crtsh => {
            let client = CrtShClient::new(
                &config.crtsh.base_url,
                Duration::from_secs(config.crtsh.timeout_secs),
                config.crtsh.max_entries,
            )?;
            Ok(Box::new(client))
        }
        SourceKind::SearchApi => {
            let client = SearchApiClient::new(
                &config.search_api.base_url,
                config.search_api.api_token.clone(),
                Duration::from_secs(config.search_api.timeout_secs),
            )?;
            Ok(Box::new(client))
        }
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .user_agent(concat!("ct-viewer/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Send a GET and return the body, mapping failures onto [`LookupError`]
pub(crate) async fn get_body(
    source_name: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, LookupError> {
    let response = request.send().await.map_err(|e| LookupError::Request {
        source_name: source_name.to_string(),
        source: e,
    })?;

    if !response.status().is_success() {
        return Err(LookupError::Status {
            source_name: source_name.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(|e| LookupError::Request {
        source_name: source_name.to_string(),
        source: e,
    })
}
