//! Domain-specific error types.
//!
//! Typed errors (via [`thiserror`]) cover the two unit boundaries of a run:
//! a single exclusion list ([`MergeError`]) and a single service
//! ([`ServiceError`]). Both are local failures by design — the batch
//! orchestrator reports them and keeps processing sibling units, so neither
//! ever aborts a run. The binary boundary converts to [`anyhow::Error`] via
//! `?` as usual.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while merging one exclusion list file.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The target file does not exist.
    #[error("exclusion list not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading or writing the file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path of the file being merged.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Failure while restarting one vendor service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service is not installed on this machine. Informational — the
    /// orchestrator treats this as a skip, not a failure.
    #[error("service '{0}' is not installed")]
    NotInstalled(String),

    /// The service exists but the restart call failed.
    #[error("failed to restart service '{service}': {detail}")]
    RestartFailed {
        /// Name of the service.
        service: String,
        /// Trimmed stderr (or exit status) from the restart call.
        detail: String,
    },
}
