use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::time::Duration;

use super::paths::default_bin_dir;
use crate::download::Fetch;
use crate::http::{DEFAULT_TIMEOUT_SECS, HttpClient, USER_AGENT};
use crate::runtime::Runtime;

pub struct Config<R: Runtime, F: Fetch> {
    pub runtime: R,
    pub fetcher: F,
    pub bin_dir: PathBuf,
}

impl<R: Runtime> Config<R, HttpClient> {
    /// Resolve the bin dir and build an HTTP client with `timeout` applied to each download.
    pub fn new(runtime: R, bin_dir: Option<PathBuf>, timeout: Option<Duration>) -> Result<Self> {
        let bin_dir = match bin_dir {
            Some(dir) => dir,
            None => default_bin_dir(&runtime)?,
        };
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let fetcher = HttpClient::new(build_client(&runtime, timeout)?);

        Ok(Self {
            runtime,
            fetcher,
            bin_dir,
        })
    }
}

fn build_client<R: Runtime>(runtime: &R, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("GITHUB_TOKEN contains invalid characters")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using GITHUB_TOKEN for authentication: {}", mask(&token));
    }

    debug!("Download timeout: {:?}", timeout);
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
