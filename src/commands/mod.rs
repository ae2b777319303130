//! Command implementations behind the CLI.

mod catalog;
mod install;
mod resolve;

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::{ArtifactCatalog, DEFAULT_BASE_URL, parse_checksum_arg};
use crate::checksum::Sha256Digest;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

pub use catalog::catalog;
pub use install::{InstallRequest, install, run as run_install};
pub use resolve::resolve;

/// Where the catalog for a command comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    /// A catalog JSON file
    File(PathBuf),
    /// The built-in kaytu release template
    Release {
        version: String,
        /// `<os>-<arch>=<sha256>` arguments
        checksums: Vec<String>,
        base_url: Option<String>,
    },
}

impl CatalogSource {
    pub fn load<R: Runtime>(&self, runtime: &R) -> Result<ArtifactCatalog> {
        match self {
            CatalogSource::File(path) => ArtifactCatalog::load(runtime, path),
            CatalogSource::Release {
                version,
                checksums,
                base_url,
            } => ArtifactCatalog::kaytu_with_base_url(
                base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
                version,
                &parse_checksums(checksums)?,
            ),
        }
    }
}

/// Parse `<os>-<arch>=<sha256>` arguments, rejecting repeated platforms.
pub fn parse_checksums(args: &[String]) -> Result<HashMap<PlatformKey, Sha256Digest>> {
    let mut checksums = HashMap::new();
    for arg in args {
        let (platform, digest) = parse_checksum_arg(arg)?;
        if checksums.contains_key(&platform) {
            bail!("Checksum for {} given more than once", platform);
        }
        checksums.insert(platform, digest);
    }
    Ok(checksums)
}

/// The detected host platform, with either half overridable.
pub fn host_platform(os: Option<&str>, arch: Option<&str>) -> PlatformKey {
    let detected = PlatformKey::detect();
    PlatformKey {
        os: os.map(Into::into).unwrap_or(detected.os),
        arch: arch.map(Into::into).unwrap_or(detected.arch),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    pub(crate) fn checksum_args(body: &[u8]) -> Vec<String> {
        PlatformKey::supported()
            .iter()
            .map(|p| format!("{}={}", p, Sha256Digest::of_bytes(body)))
            .collect()
    }

    #[test]
    fn test_parse_checksums() {
        let checksums = parse_checksums(&checksum_args(b"kaytu")).unwrap();
        assert_eq!(checksums.len(), 4);
        assert_eq!(
            checksums.get(&PlatformKey::new("darwin", "arm64")),
            Some(&Sha256Digest::of_bytes(b"kaytu"))
        );
    }

    #[test]
    fn test_parse_checksums_duplicate() {
        let digest = Sha256Digest::of_bytes(b"kaytu");
        let args = vec![
            format!("linux-amd64={}", digest),
            format!("linux-x86_64={}", digest),
        ];
        let err = parse_checksums(&args).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_release_source_uses_base_url() {
        let source = CatalogSource::Release {
            version: "v1.2.3".into(),
            checksums: checksum_args(b"kaytu"),
            base_url: Some("http://127.0.0.1:9000".into()),
        };
        // The template needs no runtime access
        let catalog = source.load(&MockRuntime::new()).unwrap();

        assert_eq!(catalog.version, "1.2.3");
        let artifact = catalog
            .resolve(&PlatformKey::new("linux", "arm64"))
            .unwrap();
        assert_eq!(artifact.url, "http://127.0.0.1:9000/v1.2.3/kaytu-linux-arm64");
    }

    #[test]
    fn test_release_source_defaults_to_github() {
        let source = CatalogSource::Release {
            version: "1.2.3".into(),
            checksums: checksum_args(b"kaytu"),
            base_url: None,
        };
        let catalog = source.load(&MockRuntime::new()).unwrap();
        assert!(
            catalog.artifacts[0]
                .url
                .starts_with("https://github.com/kaytu-io/kaytu/releases/download/v1.2.3/")
        );
    }

    #[test]
    fn test_host_platform_overrides() {
        let detected = PlatformKey::detect();

        assert_eq!(host_platform(None, None), detected);

        let host = host_platform(Some("windows"), None);
        assert_eq!(host.os.to_string(), "windows");
        assert_eq!(host.arch, detected.arch);

        let host = host_platform(Some("darwin"), Some("aarch64"));
        assert_eq!(host, PlatformKey::new("darwin", "arm64"));
    }
}
