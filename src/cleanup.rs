//! Removal of staging files when an install is interrupted.
//!
//! Normal error paths delete their own staging files. This context only covers
//! Ctrl-C, where the process exits without unwinding the install.

use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::error::EXIT_INTERRUPTED;

/// Staging paths to delete on interruption
#[derive(Default)]
pub struct CleanupContext {
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every registered file that still exists
    pub fn cleanup(&self) {
        for path in &self.paths {
            debug!("Cleaning up: {:?}", path);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Keeps a path registered until the operation that owns it succeeds
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        ctx.lock().unwrap().add(path.clone());
        Self { ctx, path }
    }

    /// The path no longer needs cleanup (renamed into place or already deleted)
    pub fn success(self) {
        self.ctx.lock().unwrap().remove(&self.path);
    }
}

/// On Ctrl-C, delete everything registered in `ctx` and exit with 130.
///
/// Abort the returned handle once the guarded work has finished.
pub fn spawn_interrupt_handler(ctx: SharedCleanupContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            ctx.lock().unwrap().cleanup();
            std::process::exit(EXIT_INTERRUPTED);
        }
    })
}
