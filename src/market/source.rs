//! Dataset sources: a local file or a URL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::DatasetSource;

/// Reads the dataset from a file on disk.
pub struct FileDatasetSource {
    path: PathBuf,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    async fn fetch(&self) -> Result<String> {
        debug!(path = %self.path.display(), "Reading borough dataset");
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read dataset file: {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Downloads the dataset over HTTP.
pub struct HttpDatasetSource {
    http: Client,
    url: String,
}

impl HttpDatasetSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("propval/0.1.0")
            .build()
            .context("Failed to build HTTP client for dataset download")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "Downloading borough dataset");

        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Dataset download failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Dataset download error {status}");
        }

        resp.text().await.context("Failed to read dataset body")
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
