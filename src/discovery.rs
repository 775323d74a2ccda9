//! Recursive search for exclusion lists under the vendor data root.
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Lazily yield every file named `file_name` (case-insensitive) under
/// `root`, searched recursively.
///
/// Traversal errors — permission-denied subdirectories, vanished entries —
/// are swallowed so one unreadable subtree never aborts the search. A
/// missing root simply yields nothing.
#[must_use]
pub fn find_lists(root: &Path, file_name: &str) -> impl Iterator<Item = PathBuf> + 'static {
    let wanted = file_name.to_owned();
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(move |entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .eq_ignore_ascii_case(&wanted)
        })
        .map(walkdir::DirEntry::into_path)
}
