use anyhow::Result;
use std::path::Path;

use super::CatalogSource;
use crate::catalog::ArtifactCatalog;
use crate::runtime::Runtime;

/// Render the kaytu release catalog as JSON, to `output` or stdout.
#[tracing::instrument(skip(runtime, checksums))]
pub fn catalog<R: Runtime>(
    runtime: &R,
    version: &str,
    checksums: &[String],
    base_url: Option<&str>,
    output: Option<&Path>,
) -> Result<ArtifactCatalog> {
    let source = CatalogSource::Release {
        version: version.to_string(),
        checksums: checksums.to_vec(),
        base_url: base_url.map(str::to_string),
    };
    let catalog = source.load(runtime)?;

    match output {
        Some(path) => {
            catalog.save(runtime, path)?;
            println!(
                "     wrote {} {} catalog to {}",
                catalog.name,
                catalog.version,
                path.display()
            );
        }
        None => println!("{}", catalog.to_json()?),
    }

    Ok(catalog)
}
