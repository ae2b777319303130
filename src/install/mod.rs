//! Fetch, verify and place a release artifact for the current host.
//!
//! The install is staged next to the target as a hidden file and renamed over
//! the target as the last step, so the target path only ever holds a complete,
//! verified executable (the previous one or the new one).

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    archive::TarGzExtractor,
    catalog::{ArchiveFormat, ArtifactCatalog, ReleaseArtifact},
    checksum::Sha256Digest,
    cleanup::{CleanupGuard, SharedCleanupContext, new_shared, spawn_interrupt_handler},
    download::{Fetch, download_file},
    error::InstallError,
    platform::PlatformKey,
    runtime::Runtime,
};

pub mod config;
mod paths;

pub use config::Config;
pub use paths::{default_bin_dir, is_on_path};
pub use self_test::{SelfTestReport, VERSION_ARG, self_test};

use paths::staging_path;

/// Permissions for installed binaries
pub const EXECUTABLE_MODE: u32 = 0o755;

pub struct Installer<R: Runtime, F: Fetch> {
    runtime: R,
    fetcher: F,
    extractor: TarGzExtractor,
}

impl<R: Runtime, F: Fetch> Installer<R, F> {
    pub fn new(runtime: R, fetcher: F) -> Self {
        Self {
            runtime,
            fetcher,
            extractor: TarGzExtractor,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Install the catalog's artifact for `host` into `bin_dir`, returning the installed path.
    ///
    /// Nothing is fetched for a host the catalog does not cover. On failure no
    /// staging file is left behind and an existing install stays untouched.
    #[tracing::instrument(skip(self, catalog))]
    pub async fn install(
        &self,
        catalog: &ArtifactCatalog,
        host: &PlatformKey,
        bin_dir: &Path,
    ) -> Result<PathBuf> {
        let artifact = catalog.resolve(host)?;
        println!(
            "   resolving {} {} for {}",
            catalog.name, catalog.version, host
        );
        debug!("Selected artifact: {:?}", artifact);

        let cleanup_ctx = new_shared();
        let interrupt_handler = spawn_interrupt_handler(Arc::clone(&cleanup_ctx));

        let result = self
            .install_artifact(artifact, bin_dir, Arc::clone(&cleanup_ctx))
            .await;

        interrupt_handler.abort();

        let target = result?;
        println!(
            "   installed {} {} to {}",
            catalog.name,
            catalog.version,
            target.display()
        );
        Ok(target)
    }

    /// Run the installed binary with `--version`.
    pub fn self_test(&self, binary: &Path, expected_version: Option<&str>) -> Result<SelfTestReport> {
        self_test(&self.runtime, binary, expected_version)
    }

    async fn install_artifact(
        &self,
        artifact: &ReleaseArtifact,
        bin_dir: &Path,
        cleanup_ctx: SharedCleanupContext,
    ) -> Result<PathBuf> {
        self.runtime
            .create_dir_all(bin_dir)
            .with_context(|| format!("Failed to create bin directory {:?}", bin_dir))?;

        let target = bin_dir.join(&artifact.install_name);
        let download_path = staging_path(bin_dir, &artifact.install_name, "part");
        let extract_path = staging_path(bin_dir, &artifact.install_name, "new");

        let download_guard = CleanupGuard::new(Arc::clone(&cleanup_ctx), download_path.clone());
        let extract_guard = CleanupGuard::new(Arc::clone(&cleanup_ctx), extract_path.clone());

        let result = match self
            .stage(artifact, &download_path, &extract_path)
            .await
        {
            Ok(staged) => {
                println!("  installing {}", target.display());
                self.runtime
                    .rename(&staged, &target)
                    .with_context(|| format!("Failed to move binary into place at {:?}", target))
                    .map(|_| target)
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.discard(&download_path);
            self.discard(&extract_path);
        }
        download_guard.success();
        extract_guard.success();

        result
    }

    /// Download, verify and unpack the artifact. Returns the staged executable.
    async fn stage(
        &self,
        artifact: &ReleaseArtifact,
        download_path: &Path,
        extract_path: &Path,
    ) -> Result<PathBuf> {
        println!(" downloading {}", artifact.url);
        download_file(&self.runtime, &self.fetcher, &artifact.url, download_path).await?;

        let actual = Sha256Digest::of_file(&self.runtime, download_path)?;
        if actual != artifact.sha256 {
            return Err(InstallError::IntegrityCheckFailed {
                url: artifact.url.clone(),
                expected: artifact.sha256.clone(),
                actual,
            }
            .into());
        }
        info!("Verified sha256 {}", actual);

        let staged = match artifact.format {
            ArchiveFormat::RawBinary => download_path.to_path_buf(),
            ArchiveFormat::TarGz => {
                println!("  extracting {}", artifact.entry);
                self.extractor
                    .extract_entry(&self.runtime, download_path, &artifact.entry, extract_path)
                    .map_err(|e| InstallError::CorruptArchive {
                        entry: artifact.entry.clone(),
                        reason: format!("{:#}", e),
                    })?;
                self.discard(download_path);
                extract_path.to_path_buf()
            }
        };

        self.runtime
            .set_permissions(&staged, EXECUTABLE_MODE)
            .with_context(|| format!("Failed to make {:?} executable", staged))?;

        Ok(staged)
    }

    fn discard(&self, path: &Path) {
        if self.runtime.exists(path) {
            debug!("Removing staging file {:?}", path);
            if let Err(e) = self.runtime.remove_file(path) {
                warn!("Failed to remove staging file {:?}: {}", path, e);
            }
        }
    }
}
