//! Address lookup client.
//!
//! Formats the postcode, asks the lookup service for candidate addresses
//! and maps the body straight into `AddressLookupResult`, whatever the
//! status code. Transport and decoding failures degrade to an
//! "unavailable" result so the public form always has something to render.
//!
//! Endpoint: `GET {base}/api/addresses/lookup?postcode=<formatted>`
//! One attempt per call; no retries and no caching.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::AddressLookup;
use crate::postcode;
use crate::types::AddressLookupResult;

const LOOKUP_PATH: &str = "/api/addresses/lookup";

/// HTTP client for the address lookup service.
pub struct AddressResolver {
    http: Client,
    base_url: String,
}

impl AddressResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("propval/0.1.0")
            .build()
            .context("Failed to build HTTP client for address lookup")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn lookup_url(&self, formatted: &str) -> String {
        format!(
            "{}{LOOKUP_PATH}?postcode={}",
            self.base_url,
            urlencoding::encode(formatted)
        )
    }

    async fn fetch(&self, url: &str) -> Result<AddressLookupResult> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("Address lookup request failed")?;

        // Error statuses still carry a lookup result ("Postcode not found").
        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read address lookup response")?;

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse address lookup response ({status})"))
    }
}

#[async_trait]
impl AddressLookup for AddressResolver {
    async fn lookup(&self, postcode: &str) -> AddressLookupResult {
        let formatted = postcode::format(postcode);
        let url = self.lookup_url(&formatted);
        debug!(postcode = %formatted, "Looking up addresses");

        match self.fetch(&url).await {
            Ok(result) => {
                let result = result.normalized();
                debug!(
                    postcode = %formatted,
                    valid = result.valid,
                    count = result.addresses.len(),
                    "Address lookup complete"
                );
                result
            }
            Err(e) => {
                let cause = format!("{e:#}");
                warn!(postcode = %formatted, error = %cause, "Address lookup unavailable");
                AddressLookupResult::unavailable()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
