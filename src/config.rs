//! Run configuration: vendor paths, candidate executables, service names.
//!
//! Everything the orchestrator needs is carried in an explicit [`Config`]
//! value rather than process-wide constants, so the merge core can be
//! exercised against temp directories without touching the real vendor tree.
use std::path::PathBuf;

/// Vendor data root searched for exclusion lists on Windows.
pub const DEFAULT_ROOT: &str = r"C:\ProgramData\A-Volute";

/// Filename of the exclusion list consumed by the vendor services.
pub const LIST_FILE_NAME: &str = "BlackApps.dat";

/// Vendor service names to restart after a successful merge.
///
/// Older suites install `NahimicService`, newer ones `NahimicSvc`; most
/// machines have exactly one of the two.
pub const SERVICES: &[&str] = &["NahimicService", "NahimicSvc"];

/// Game executables known to stutter while the audio service is attached.
///
/// Extend by adding literal names; comparison against existing entries is
/// case-insensitive, so capitalisation only affects what gets written for
/// new entries.
pub const DEFAULT_APPS: &[&str] = &[
    "RainbowSix.exe",
    "RainbowSix_Vulkan.exe",
    "r5apex.exe",
    "ModernWarfare.exe",
    "bf1.exe",
    "bfv.exe",
    "TslGame.exe",
    "FortniteClient-Win64-Shipping.exe",
    "VALORANT-Win64-Shipping.exe",
    "destiny2.exe",
    "GTA5.exe",
    "RDR2.exe",
];

/// Explicit configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree searched recursively for exclusion lists.
    pub root: PathBuf,
    /// Exclusion list filename to look for (compared case-insensitively).
    pub file_name: String,
    /// Executable names that should be present in every list.
    pub candidates: Vec<String>,
    /// Services to restart when any list changed.
    pub services: Vec<String>,
}

impl Config {
    /// The vendor defaults, with `root` optionally overridden from the CLI.
    #[must_use]
    pub fn vendor_default(root_override: Option<PathBuf>) -> Self {
        Self {
            root: root_override.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            file_name: LIST_FILE_NAME.to_string(),
            candidates: DEFAULT_APPS.iter().map(ToString::to_string).collect(),
            services: SERVICES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Candidate list as string slices, for handing to [`crate::merge::merge_file`].
    #[must_use]
    pub fn candidate_refs(&self) -> Vec<&str> {
        self.candidates.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn vendor_default_uses_fixed_root() {
        let config = Config::vendor_default(None);
        assert_eq!(config.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(config.file_name, LIST_FILE_NAME);
    }

    #[test]
    fn vendor_default_honours_override() {
        let config = Config::vendor_default(Some(PathBuf::from("/tmp/avolute")));
        assert_eq!(config.root, PathBuf::from("/tmp/avolute"));
    }

    #[test]
    fn default_apps_are_non_empty_and_unique() {
        assert!(!DEFAULT_APPS.is_empty());
        let mut seen = std::collections::HashSet::new();
        for app in DEFAULT_APPS {
            assert!(
                seen.insert(app.to_ascii_lowercase()),
                "duplicate candidate: {app}"
            );
        }
    }

    #[test]
    fn candidate_refs_matches_candidates() {
        let config = Config::vendor_default(None);
        assert_eq!(config.candidate_refs().len(), config.candidates.len());
    }
}
