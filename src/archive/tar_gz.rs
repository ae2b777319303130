use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow, bail};
use flate2::read::GzDecoder;
use log::debug;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};

/// Extractor for .tar.gz / .tgz archives
pub struct TarGzExtractor;

impl TarGzExtractor {
    /// Copy the single file `entry` out of the archive at `archive_path` into `dest`.
    ///
    /// `entry` matches either the full path inside the archive (ignoring a
    /// leading `./`) or, when it has no directory part, the file name of any
    /// regular file. The first match wins.
    #[tracing::instrument(skip(self, runtime))]
    pub fn extract_entry<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        entry: &str,
        dest: &Path,
    ) -> Result<u64> {
        debug!("Extracting {} from {:?} to {:?}...", entry, archive_path, dest);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let wanted = normalize(Path::new(entry));
        let by_name = wanted.components().count() == 1;
        let mut seen = Vec::new();

        for item in archive
            .entries()
            .context("Failed to read archive entries")?
        {
            let mut item = item.context("Failed to read archive entry")?;
            let path = normalize(&item.path().context("Invalid entry path in archive")?);

            let matches = path == wanted || (by_name && path.file_name() == wanted.file_name());
            if !matches {
                seen.push(path.display().to_string());
                continue;
            }

            let kind = item.header().entry_type();
            if kind != EntryType::Regular && kind != EntryType::GNUSparse {
                if by_name && kind.is_dir() {
                    continue;
                }
                bail!("Archive entry {:?} is not a regular file", path);
            }

            let mut out = runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create {:?}", dest))?;
            let bytes = io::copy(&mut item, &mut out)
                .with_context(|| format!("Failed to extract {:?}", path))?;
            out.flush().context("Failed to flush extracted file")?;

            debug!("Extracted {} bytes from {:?}", bytes, path);
            return Ok(bytes);
        }

        seen.truncate(10);
        Err(anyhow!(
            "Entry '{}' not found in archive (entries: {})",
            entry,
            if seen.is_empty() {
                "none".to_string()
            } else {
                seen.join(", ")
            }
        ))
    }
}

/// Drop `.` components so `./bin/kaytu` and `bin/kaytu` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
