//! Pulling the program binary out of downloaded archives.

mod tar_gz;

pub use tar_gz::TarGzExtractor;
