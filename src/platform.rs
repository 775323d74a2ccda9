//! Platform detection and the administrator-elevation check.
use std::fmt;

use crate::exec::Executor;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux or other Unix-like system.
    Linux,
    /// Microsoft Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => write!(f, "linux"),
            Os::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    /// The detected operating system.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Linux
        };
        Self { os }
    }

    /// Create a platform with an explicit OS (for testing).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether this is a Windows system.
    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self.os, Os::Windows)
    }
}

/// Whether the current process runs with administrator rights.
///
/// `net session` succeeds only in an elevated shell, which makes it a cheap
/// presence probe without touching the Win32 token APIs. Returns `None` on
/// non-Windows platforms where the question does not apply.
///
/// The caller only reports the answer — this tool never re-launches itself
/// elevated; an unprivileged write simply fails per-file later.
#[must_use]
pub fn is_elevated(platform: &Platform, executor: &dyn Executor) -> Option<bool> {
    if !platform.is_windows() {
        return None;
    }
    let elevated = executor
        .run_unchecked("net", &["session"])
        .is_ok_and(|r| r.success);
    Some(elevated)
}
