//! SHA-256 digests for verifying downloaded artifacts.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::runtime::Runtime;

/// A validated SHA-256 digest: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new digest, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix, in either case.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let hex = s.trim();
        let hex = hex.strip_prefix("sha256:").unwrap_or(hex);

        if hex.len() != 64 {
            bail!(
                "Invalid SHA256 digest: expected 64 hex characters, got {} in '{}'",
                hex.len(),
                s
            );
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid SHA256 digest: contains non-hex characters in '{}'", s);
        }

        Ok(Self(hex.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest of an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Digest of everything `reader` yields.
    pub fn of_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).context("Failed to read data for hashing")?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Digest of a file, streamed through the runtime.
    #[tracing::instrument(skip(runtime))]
    pub fn of_file<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let reader = runtime
            .open(path)
            .with_context(|| format!("Failed to open {:?} for hashing", path))?;
        Self::of_reader(reader)
    }
}

impl FromStr for Sha256Digest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
