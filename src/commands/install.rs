use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::CatalogSource;
use crate::download::Fetch;
use crate::install::{Config, Installer, VERSION_ARG, is_on_path};
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// Everything the `install` command needs
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub source: CatalogSource,
    pub platform: PlatformKey,
    pub bin_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub skip_self_test: bool,
}

#[tracing::instrument(skip(runtime))]
pub async fn install<R: Runtime>(runtime: R, request: InstallRequest) -> Result<PathBuf> {
    let config = Config::new(runtime, request.bin_dir, request.timeout)?;
    run(
        config,
        &request.source,
        &request.platform,
        request.skip_self_test,
    )
    .await
}

/// Install and then self-test the binary. A failed self-test leaves the binary in place.
///
/// A binary built for another platform than the host is not self-tested.
pub async fn run<R: Runtime, F: Fetch>(
    config: Config<R, F>,
    source: &CatalogSource,
    platform: &PlatformKey,
    skip_self_test: bool,
) -> Result<PathBuf> {
    let catalog = source.load(&config.runtime)?;
    let installer = Installer::new(config.runtime, config.fetcher);

    let target = installer
        .install(&catalog, platform, &config.bin_dir)
        .await?;

    let host = PlatformKey::detect();
    if skip_self_test {
        info!("Skipping self-test of {}", target.display());
    } else if *platform != host {
        info!(
            "Skipping self-test of {}: built for {}, this host is {}",
            target.display(),
            platform,
            host
        );
    } else {
        let report = installer.self_test(&target, Some(catalog.version.as_str()))?;
        println!("    verified {} {}: {}", catalog.name, VERSION_ARG, report.output);
    }

    if let Some(hint) = path_hint(installer.runtime(), &config.bin_dir) {
        println!("{}", hint);
    }

    Ok(target)
}

/// A note for the user when `bin_dir` is not on their PATH
fn path_hint<R: Runtime>(runtime: &R, bin_dir: &Path) -> Option<String> {
    let path_var = runtime.env_var("PATH").unwrap_or_default();
    if is_on_path(bin_dir, &path_var) {
        return None;
    }
    Some(format!(
        "\nNote: {} is not on your PATH. Add it with:\n    export PATH=\"{}:$PATH\"",
        bin_dir.display(),
        bin_dir.display()
    ))
}
