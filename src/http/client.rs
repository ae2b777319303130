//! HTTP client for artifact downloads.
//!
//! Each download is a single attempt; re-running the install is the retry.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::io::Write;

use super::status::HttpStatusError;

pub const USER_AGENT: &str = "kaytu-install";

/// Applies to the whole request, body included.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Streams the body at `url` into `writer`, returning the number of bytes written.
    ///
    /// Non-success statuses fail with an [`HttpStatusError`] before anything is written.
    #[tracing::instrument(skip(self, writer))]
    pub async fn download_to<W: Write + ?Sized>(&self, url: &str, writer: &mut W) -> Result<u64> {
        debug!("Downloading file from {}...", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpStatusError::classify(status).into());
        }

        let mut downloaded_bytes: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}
