//! The kaytu release template.
//!
//! Every kaytu release publishes the same four raw binaries; only the version
//! and the checksums change between releases.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;

use super::{ArchiveFormat, ArtifactCatalog, ReleaseArtifact};
use crate::checksum::Sha256Digest;
use crate::platform::{Architecture, OperatingSystem, PlatformKey};

pub const DEFAULT_BASE_URL: &str = "https://github.com/kaytu-io/kaytu/releases/download";

const NAME: &str = "kaytu";
const DESCRIPTION: &str = "CLI application for Kaytu";
const HOMEPAGE: &str = "https://github.com/kaytu-io/cli-program";
const LICENSE: &str = "MIT";

/// Name the binary carries inside the release for a platform.
fn entry_name(platform: &PlatformKey) -> String {
    let os = match &platform.os {
        OperatingSystem::MacOs => "macos".to_string(),
        other => other.to_string(),
    };
    format!("ktucli-{}-{}", os, platform.arch)
}

impl ArtifactCatalog {
    /// The kaytu catalog for `version`, downloading from GitHub releases.
    pub fn kaytu(version: &str, checksums: &HashMap<PlatformKey, Sha256Digest>) -> Result<Self> {
        Self::kaytu_with_base_url(DEFAULT_BASE_URL, version, checksums)
    }

    /// The kaytu catalog for `version`, downloading from `base_url` (a mirror).
    ///
    /// Every published platform needs a checksum.
    pub fn kaytu_with_base_url(
        base_url: &str,
        version: &str,
        checksums: &HashMap<PlatformKey, Sha256Digest>,
    ) -> Result<Self> {
        let version = version.trim().trim_start_matches('v');
        if version.is_empty() {
            bail!("Release version must not be empty");
        }

        let supported = PlatformKey::supported();
        if let Some(extra) = checksums.keys().find(|k| !supported.contains(k)) {
            bail!(
                "kaytu is not published for {}. Known platforms: {}",
                extra,
                supported
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let base_url = base_url.trim_end_matches('/');
        let artifacts = supported
            .into_iter()
            .map(|platform| {
                let sha256 = checksums
                    .get(&platform)
                    .cloned()
                    .ok_or_else(|| anyhow!("Missing checksum for {}", platform))?;
                Ok(ReleaseArtifact {
                    url: format!("{}/v{}/{}-{}", base_url, version, NAME, platform),
                    sha256,
                    format: ArchiveFormat::RawBinary,
                    entry: entry_name(&platform),
                    install_name: NAME.to_string(),
                    platform,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ArtifactCatalog {
            name: NAME.to_string(),
            version: version.to_string(),
            description: Some(DESCRIPTION.to_string()),
            homepage: Some(HOMEPAGE.to_string()),
            license: Some(LICENSE.to_string()),
            artifacts,
        })
    }
}

/// Parse a `<platform>=<sha256>` command line argument.
pub fn parse_checksum_arg(arg: &str) -> Result<(PlatformKey, Sha256Digest)> {
    let (platform, digest) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid checksum '{}'. Expected <os>-<arch>=<sha256>", arg))?;
    let platform: PlatformKey = platform.parse()?;
    if matches!(platform.os, OperatingSystem::Other(_))
        || matches!(platform.arch, Architecture::Other(_))
    {
        bail!("Unknown platform '{}' in checksum '{}'", platform, arg);
    }
    let digest = Sha256Digest::new(digest).with_context(|| format!("In checksum for {}", platform))?;
    Ok((platform, digest))
}
