use anyhow::Result;
use log::debug;

use super::CatalogSource;
use crate::catalog::ReleaseArtifact;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// Print the artifact `platform` would install, without downloading anything.
#[tracing::instrument(skip(runtime))]
pub fn resolve<R: Runtime>(
    runtime: &R,
    source: &CatalogSource,
    platform: &PlatformKey,
) -> Result<ReleaseArtifact> {
    let catalog = source.load(runtime)?;
    let artifact = catalog.resolve(platform)?.clone();
    debug!("Resolved {} to {:?}", platform, artifact);

    println!("{} {} ({})", catalog.name, catalog.version, platform);
    println!("  url:     {}", artifact.url);
    println!("  sha256:  {}", artifact.sha256);
    println!("  format:  {}", artifact.format);
    println!("  entry:   {}", artifact.entry);
    println!("  install: {}", artifact.install_name);

    Ok(artifact)
}
