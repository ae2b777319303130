use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host operating system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperatingSystem {
    MacOs,
    Linux,
    /// Anything without published artifacts, kept verbatim (lowercased).
    Other(String),
}

/// Host CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Architecture {
    Amd64,
    Arm64,
    Other(String),
}

impl From<&str> for OperatingSystem {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "darwin" | "macos" | "osx" | "mac" => OperatingSystem::MacOs,
            "linux" => OperatingSystem::Linux,
            other => OperatingSystem::Other(other.to_string()),
        }
    }
}

impl From<String> for OperatingSystem {
    fn from(s: String) -> Self {
        OperatingSystem::from(s.as_str())
    }
}

impl From<OperatingSystem> for String {
    fn from(os: OperatingSystem) -> Self {
        os.to_string()
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingSystem::MacOs => write!(f, "darwin"),
            OperatingSystem::Linux => write!(f, "linux"),
            OperatingSystem::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for Architecture {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" | "intel" => Architecture::Amd64,
            "arm64" | "aarch64" | "arm" => Architecture::Arm64,
            other => Architecture::Other(other.to_string()),
        }
    }
}

impl From<String> for Architecture {
    fn from(s: String) -> Self {
        Architecture::from(s.as_str())
    }
}

impl From<Architecture> for String {
    fn from(arch: Architecture) -> Self {
        arch.to_string()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Amd64 => write!(f, "amd64"),
            Architecture::Arm64 => write!(f, "arm64"),
            Architecture::Other(name) => write!(f, "{}", name),
        }
    }
}

/// The (operating system, architecture) pair an artifact targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl PlatformKey {
    pub fn new(os: impl Into<OperatingSystem>, arch: impl Into<Architecture>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The four platforms kaytu publishes binaries for.
    pub fn supported() -> [PlatformKey; 4] {
        [
            PlatformKey::new(OperatingSystem::MacOs, Architecture::Amd64),
            PlatformKey::new(OperatingSystem::MacOs, Architecture::Arm64),
            PlatformKey::new(OperatingSystem::Linux, Architecture::Arm64),
            PlatformKey::new(OperatingSystem::Linux, Architecture::Amd64),
        ]
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for PlatformKey {
    type Err = anyhow::Error;

    /// Parses `<os>-<arch>` or `<os>/<arch>`, e.g. `darwin-arm64` or `linux/x86_64`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        // x86_64 uses an underscore, so the first dash or slash always ends the os part
        let (os, arch) = s
            .split_once(['-', '/'])
            .filter(|(os, arch)| !os.is_empty() && !arch.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Invalid platform '{}'. Expected <os>-<arch>, e.g. linux-amd64",
                    s
                )
            })?;
        Ok(PlatformKey::new(os, arch))
    }
}
