//! Terminal install failures.
//!
//! Functions return `anyhow::Result`; these variants travel inside
//! `anyhow::Error` and are recovered with [`InstallError::find`].

use std::path::PathBuf;

use crate::checksum::Sha256Digest;
use crate::platform::PlatformKey;

/// Exit code for any failure outside the install taxonomy.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code after Ctrl-C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug)]
pub enum InstallError {
    /// The catalog has no artifact for this host.
    UnsupportedPlatform {
        platform: PlatformKey,
        available: Vec<PlatformKey>,
    },
    /// Network failure or non-success HTTP status.
    DownloadFailed { url: String, reason: String },
    /// The downloaded bytes do not hash to the published checksum.
    IntegrityCheckFailed {
        url: String,
        expected: Sha256Digest,
        actual: Sha256Digest,
    },
    /// The archive could not be read, or lacks the expected entry.
    CorruptArchive { entry: String, reason: String },
    /// The installed binary did not answer `--version` successfully.
    SelfTestFailed { path: PathBuf, reason: String },
}

impl InstallError {
    pub fn kind(&self) -> &'static str {
        match self {
            InstallError::UnsupportedPlatform { .. } => "UnsupportedPlatform",
            InstallError::DownloadFailed { .. } => "DownloadFailed",
            InstallError::IntegrityCheckFailed { .. } => "IntegrityCheckFailed",
            InstallError::CorruptArchive { .. } => "CorruptArchive",
            InstallError::SelfTestFailed { .. } => "SelfTestFailed",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::UnsupportedPlatform { .. } => 2,
            InstallError::DownloadFailed { .. } => 3,
            InstallError::IntegrityCheckFailed { .. } => 4,
            InstallError::CorruptArchive { .. } => 5,
            InstallError::SelfTestFailed { .. } => 6,
        }
    }

    /// The install failure somewhere in `err`'s chain, if any.
    pub fn find(err: &anyhow::Error) -> Option<&InstallError> {
        err.chain().find_map(|cause| cause.downcast_ref::<InstallError>())
    }
}

/// Process exit code for an error returned by a command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    InstallError::find(err)
        .map(InstallError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.kind())?;
        match self {
            InstallError::UnsupportedPlatform {
                platform,
                available,
            } => {
                let available = available
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "no artifact for {} (available: {})",
                    platform, available
                )
            }
            InstallError::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            InstallError::IntegrityCheckFailed {
                url,
                expected,
                actual,
            } => write!(
                f,
                "checksum mismatch for {} (expected {}, got {})",
                url, expected, actual
            ),
            InstallError::CorruptArchive { entry, reason } => {
                write!(f, "cannot extract '{}': {}", entry, reason)
            }
            InstallError::SelfTestFailed { path, reason } => {
                write!(f, "{} --version failed: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for InstallError {}
