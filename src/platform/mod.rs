//! Platform model and host detection
//!
//! A [`PlatformKey`] names the (operating system, CPU architecture) pair a
//! release artifact is built for. Release assets use Go-style names
//! (`darwin`, `amd64`), while Rust reports `macos` and `x86_64`; both spellings
//! parse to the same key.

mod detection;
mod key;

pub use key::{Architecture, OperatingSystem, PlatformKey};
