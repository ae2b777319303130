use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Where the binary goes when no bin dir is configured
#[tracing::instrument(skip(runtime))]
pub fn default_bin_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let dir = if runtime.is_privileged() {
        system_bin_dir()
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        home_dir.join(".local").join("bin")
    };
    info!("Using bin dir: {}", dir.display());
    Ok(dir)
}

#[cfg(target_os = "windows")]
fn system_bin_dir() -> PathBuf {
    PathBuf::from(r"C:\ProgramData\kaytu\bin")
}

#[cfg(not(target_os = "windows"))]
fn system_bin_dir() -> PathBuf {
    PathBuf::from("/usr/local/bin")
}

/// Whether `dir` is one of the entries of a PATH-style variable
pub fn is_on_path(dir: &Path, path_var: &str) -> bool {
    std::env::split_paths(path_var).any(|entry| entry == dir)
}

/// Hidden sibling of the install target, so renaming it over the target
/// never crosses a filesystem boundary.
pub(crate) fn staging_path(bin_dir: &Path, install_name: &str, suffix: &str) -> PathBuf {
    bin_dir.join(format!(
        ".{}.{}.{}",
        install_name,
        std::process::id(),
        suffix
    ))
}
