//! The idempotent read–merge–write core.
//!
//! An exclusion list is a flat sequence of executable names, one per line,
//! in whatever single-byte encoding the vendor shipped it with. The merge
//! never transcodes: existing lines are carried through byte-for-byte, and
//! membership uses ordinal ASCII case folding (never locale-aware), which
//! matches the exact-match semantics of the consuming service.
//!
//! Writes only happen when something was actually appended, and they go
//! through a sibling temp file persisted over the target in a single
//! rename, so a crash mid-write can never leave a truncated list behind.
use std::collections::HashSet;
use std::io::Write as _;
use std::path::Path;

use crate::error::MergeError;

/// Result of merging one exclusion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Whether the file on disk was (or, in dry-run, would be) modified.
    pub modified: bool,
    /// Candidate names appended, in append order.
    pub added: Vec<String>,
}

/// Line terminator convention of an existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    /// Detect the convention used by `content`.
    ///
    /// Empty or single-unterminated-line files default to CRLF: the
    /// consuming application is a Windows service.
    fn detect(content: &[u8]) -> Self {
        if content.windows(2).any(|w| w == b"\r\n") {
            Self::CrLf
        } else if content.contains(&b'\n') {
            Self::Lf
        } else {
            Self::CrLf
        }
    }

    const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Split raw file content into entry lines, without the terminators.
///
/// Trailing empty segments (the terminal newline plus any blank trailing
/// lines) are dropped so that appended entries land directly after the
/// last real entry; interior blank lines are preserved as-is.
fn split_lines(content: &[u8]) -> Vec<Vec<u8>> {
    if content.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<Vec<u8>> = content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    while lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    lines
}

/// Render entry lines back to file content: one entry per line, the
/// detected terminator after every entry including the last.
fn render(lines: &[Vec<u8>], newline: Newline) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines.iter().map(Vec::len).sum::<usize>() + 2 * lines.len());
    for line in lines {
        out.extend_from_slice(line);
        out.extend_from_slice(newline.as_bytes());
    }
    out
}

fn io_error(path: &Path, source: std::io::Error) -> MergeError {
    MergeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Replace the contents of `path` atomically from the consumer's point of
/// view: write a sibling temp file, then persist it over the target in one
/// rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), MergeError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    tmp.write_all(content).map_err(|e| io_error(path, e))?;
    tmp.flush().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

/// Merge `candidates` into the exclusion list at `path`.
///
/// Existing entries keep their exact bytes and relative order; candidates
/// not yet present (case-insensitively) are appended at the end in the
/// order given. Duplicates within `candidates` append at most once, and
/// empty candidate strings are ignored. Re-running with the same candidates
/// is always a no-op.
///
/// With `dry_run` set, the read and merge steps run in full — so the
/// returned [`MergeOutcome`] still describes what would change — but the
/// file is never written.
///
/// # Errors
///
/// [`MergeError::NotFound`] when the file does not exist, and
/// [`MergeError::Io`] when reading or writing fails. Both are meant to be
/// reported and skipped by batch callers, not to abort a run.
pub fn merge_file(
    path: &Path,
    candidates: &[&str],
    dry_run: bool,
) -> Result<MergeOutcome, MergeError> {
    if !path.exists() {
        return Err(MergeError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let newline = Newline::detect(&content);
    let mut lines = split_lines(&content);

    let mut seen: HashSet<Vec<u8>> = lines.iter().map(|l| l.to_ascii_lowercase()).collect();
    let mut added = Vec::new();
    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        if seen.insert(candidate.as_bytes().to_ascii_lowercase()) {
            lines.push(candidate.as_bytes().to_vec());
            added.push((*candidate).to_string());
        }
    }

    if added.is_empty() {
        return Ok(MergeOutcome {
            modified: false,
            added,
        });
    }
    if !dry_run {
        write_atomic(path, &render(&lines, newline))?;
    }
    Ok(MergeOutcome {
        modified: true,
        added,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn list_file(dir: &tempfile::TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("BlackApps.dat");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn appends_missing_candidates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\nb.exe\r\n");

        let outcome = merge_file(&path, &["b.exe", "c.exe", "d.exe"], false).unwrap();

        assert!(outcome.modified);
        assert_eq!(outcome.added, vec!["c.exe", "d.exe"]);
        assert_eq!(
            fs::read(&path).unwrap(),
            b"a.exe\r\nb.exe\r\nc.exe\r\nd.exe\r\n"
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n");

        let first = merge_file(&path, &["b.exe"], false).unwrap();
        assert!(first.modified);
        let bytes_after_first = fs::read(&path).unwrap();

        let second = merge_file(&path, &["b.exe"], false).unwrap();
        assert!(!second.modified);
        assert!(second.added.is_empty());
        assert_eq!(fs::read(&path).unwrap(), bytes_after_first);
    }

    #[test]
    fn dedup_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"Foo.exe\r\n");
        let before = fs::read(&path).unwrap();

        let outcome = merge_file(&path, &["foo.exe", "FOO.EXE"], false).unwrap();

        assert!(!outcome.modified);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn duplicate_candidates_append_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"");

        let outcome = merge_file(&path, &["game.exe", "Game.exe", "game.exe"], false).unwrap();

        assert_eq!(outcome.added, vec!["game.exe"]);
        assert_eq!(fs::read(&path).unwrap(), b"game.exe\r\n");
    }

    #[test]
    fn empty_candidate_list_never_modifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n");
        let before = fs::read(&path).unwrap();

        let outcome = merge_file(&path, &[], false).unwrap();

        assert!(!outcome.modified);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n");
        let before = fs::read(&path).unwrap();

        let outcome = merge_file(&path, &["b.exe"], true).unwrap();

        assert!(outcome.modified, "dry run should report 'would modify'");
        assert_eq!(outcome.added, vec!["b.exe"]);
        assert_eq!(fs::read(&path).unwrap(), before, "file bytes must be untouched");
    }

    #[test]
    fn preserves_existing_order_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"z.exe\r\nm.exe\r\na.exe\r\n");

        merge_file(&path, &["k.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"z.exe\r\nm.exe\r\na.exe\r\nk.exe\r\n");
    }

    #[test]
    fn preserves_lf_convention() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\nb.exe\n");

        merge_file(&path, &["c.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"a.exe\nb.exe\nc.exe\n");
    }

    #[test]
    fn empty_file_defaults_to_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"");

        merge_file(&path, &["a.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"a.exe\r\n");
    }

    #[test]
    fn unterminated_last_line_gains_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\nb.exe");

        merge_file(&path, &["c.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"a.exe\r\nb.exe\r\nc.exe\r\n");
    }

    #[test]
    fn trailing_blank_lines_are_not_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n\r\n\r\n");

        merge_file(&path, &["b.exe"], false).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, b"a.exe\r\nb.exe\r\n");
        assert!(!bytes.ends_with(b"\r\n\r\n"), "no blank trailing lines");
    }

    #[test]
    fn preserves_non_ascii_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        // 0xE9 is 'é' in Windows-1252; the merge must never transcode it.
        let path = list_file(&dir, b"Caf\xE9.exe\r\n");

        merge_file(&path, &["b.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"Caf\xE9.exe\r\nb.exe\r\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.dat");

        let err = merge_file(&path, &["a.exe"], false).unwrap_err();

        assert!(matches!(err, MergeError::NotFound(_)), "got: {err}");
    }

    #[test]
    fn empty_candidates_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n");

        let outcome = merge_file(&path, &["", "b.exe"], false).unwrap();

        assert_eq!(outcome.added, vec!["b.exe"]);
        assert_eq!(fs::read(&path).unwrap(), b"a.exe\r\nb.exe\r\n");
    }

    #[test]
    fn interior_blank_lines_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = list_file(&dir, b"a.exe\r\n\r\nb.exe\r\n");

        merge_file(&path, &["c.exe"], false).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"a.exe\r\n\r\nb.exe\r\nc.exe\r\n");
    }

    #[test]
    fn newline_detect() {
        assert_eq!(Newline::detect(b"a\r\nb"), Newline::CrLf);
        assert_eq!(Newline::detect(b"a\nb"), Newline::Lf);
        assert_eq!(Newline::detect(b""), Newline::CrLf);
        assert_eq!(Newline::detect(b"lonely.exe"), Newline::CrLf);
    }

    #[test]
    fn split_lines_drops_trailing_empty_segments() {
        assert_eq!(split_lines(b"a\r\nb\r\n"), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(split_lines(b"a\n\n\n"), vec![b"a".to_vec()]);
        assert!(split_lines(b"").is_empty());
        assert!(split_lines(b"\r\n\r\n").is_empty());
    }
}
