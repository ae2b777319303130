//! HTTP client module with status classification.

mod client;
mod status;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpClient, USER_AGENT};
pub use status::HttpStatusError;
