//! Release catalogs: which artifact to install on which platform.
//!
//! A catalog is authored once per release and consumed read-only by every
//! install. It is stored as JSON:
//!
//! ```json
//! {
//!   "name": "kaytu",
//!   "version": "0.9.0",
//!   "artifacts": [
//!     { "os": "linux", "arch": "amd64", "url": "https://...", "sha256": "...",
//!       "format": "raw-binary", "entry": "ktucli-linux-amd64", "install_name": "kaytu" }
//!   ]
//! }
//! ```

mod kaytu;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::checksum::Sha256Digest;
use crate::error::InstallError;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

pub use kaytu::{DEFAULT_BASE_URL, parse_checksum_arg};

/// How the binary is packaged inside the downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// The download is the executable itself.
    #[default]
    #[serde(rename = "raw-binary")]
    RawBinary,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::RawBinary => write!(f, "raw-binary"),
            ArchiveFormat::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// One downloadable build of the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    #[serde(flatten)]
    pub platform: PlatformKey,
    pub url: String,
    pub sha256: Sha256Digest,
    #[serde(default)]
    pub format: ArchiveFormat,
    /// Name of the binary inside the artifact.
    pub entry: String,
    /// Name the binary gets on the search path. Defaults to the catalog name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_name: String,
}

/// All artifacts of one release, keyed by platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCatalog {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub artifacts: Vec<ReleaseArtifact>,
}

impl ArtifactCatalog {
    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog: ArtifactCatalog =
            serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        catalog.fill_defaults();
        catalog.validate()?;
        Ok(catalog)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading catalog from {:?}", path);
        let json = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read catalog {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("Invalid catalog {:?}", path))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize catalog")
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        runtime
            .write(path, json.as_bytes())
            .with_context(|| format!("Failed to write catalog {:?}", path))
    }

    /// The artifact built for `platform`.
    ///
    /// Fails with [`InstallError::UnsupportedPlatform`] when the release has none.
    pub fn resolve(&self, platform: &PlatformKey) -> Result<&ReleaseArtifact> {
        self.artifacts
            .iter()
            .find(|a| &a.platform == platform)
            .ok_or_else(|| {
                InstallError::UnsupportedPlatform {
                    platform: platform.clone(),
                    available: self.platforms(),
                }
                .into()
            })
    }

    pub fn platforms(&self) -> Vec<PlatformKey> {
        self.artifacts.iter().map(|a| a.platform.clone()).collect()
    }

    fn fill_defaults(&mut self) {
        for artifact in &mut self.artifacts {
            if artifact.install_name.is_empty() {
                artifact.install_name = self.name.clone();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Catalog name must not be empty");
        }
        if self.version.trim().is_empty() {
            bail!("Catalog version must not be empty");
        }

        let mut seen = HashSet::new();
        for artifact in &self.artifacts {
            if !seen.insert(&artifact.platform) {
                bail!(
                    "Catalog lists more than one artifact for {}",
                    artifact.platform
                );
            }
            if artifact.entry.trim().is_empty() {
                bail!("Artifact for {} has an empty entry name", artifact.platform);
            }
            if matches!(artifact.install_name.as_str(), "." | "..")
                || artifact.install_name.contains(['/', '\\'])
            {
                bail!(
                    "Artifact for {} has an invalid install name '{}'",
                    artifact.platform,
                    artifact.install_name
                );
            }
        }
        Ok(())
    }
}
