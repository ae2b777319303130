use super::PlatformKey;

impl PlatformKey {
    /// Detect the platform of the running host.
    pub fn detect() -> Self {
        PlatformKey::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}
