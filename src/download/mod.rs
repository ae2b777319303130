use crate::error::InstallError;
use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Source of artifact bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Stream the artifact at `url` into `sink`, returning the byte count.
    async fn fetch(&self, url: &str, sink: Box<dyn Write + Send>) -> Result<u64>;
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, url: &str, mut sink: Box<dyn Write + Send>) -> Result<u64> {
        self.download_to(url, &mut *sink).await
    }
}

/// Downloads `url` into a file created at `dest` through the runtime.
///
/// Transfer failures are reported as [`InstallError::DownloadFailed`]. Creating
/// or writing `dest` fails with a plain I/O error instead.
#[tracing::instrument(skip(runtime, fetcher))]
pub async fn download_file<R: Runtime, F: Fetch>(
    runtime: &R,
    fetcher: &F,
    url: &str,
    dest: &Path,
) -> Result<u64> {
    info!("Downloading file from {}...", url);

    let file = runtime
        .create_file(dest)
        .with_context(|| format!("Failed to create download file at {:?}", dest))?;
    let sink = TrackedWriter::new(file);
    let write_failed = sink.failed_flag();

    match fetcher.fetch(url, Box::new(sink)).await {
        Ok(bytes) => {
            info!("Download complete ({} bytes).", bytes);
            Ok(bytes)
        }
        Err(e) if write_failed.load(Ordering::SeqCst) => {
            Err(e.context(format!("Failed to write download to {:?}", dest)))
        }
        Err(e) => Err(InstallError::DownloadFailed {
            url: url.to_string(),
            reason: format!("{:#}", e),
        }
        .into()),
    }
}

/// Remembers whether the local side of a download failed.
struct TrackedWriter {
    inner: Box<dyn Write + Send>,
    failed: Arc<AtomicBool>,
}

impl TrackedWriter {
    fn new(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner,
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failed)
    }

    fn track<T>(&self, result: io::Result<T>) -> io::Result<T> {
        if matches!(&result, Err(e) if e.kind() != io::ErrorKind::Interrupted) {
            self.failed.store(true, Ordering::SeqCst);
        }
        result
    }
}

impl Write for TrackedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        self.track(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.inner.flush();
        self.track(result)
    }
}
