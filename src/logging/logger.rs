//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{Log, UnitEntry, UnitStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record_unit` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/blackapps/<command>.log` (default
/// `~/.cache/blackapps/<command>.log`) with timestamps and ANSI codes
/// stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    units: Mutex<Vec<UnitEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The log file
    /// itself is created and initialised by
    /// [`init_subscriber`](super::subscriber::init_subscriber); this
    /// constructor does not write to the file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            units: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub(crate) const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded unit entries (test-only).
    #[cfg(test)]
    pub(crate) fn unit_entries(&self) -> Vec<UnitEntry> {
        self.units.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "blackapps::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: "blackapps::dry_run", "{msg}");
    }

    /// Record a unit result for the summary.
    pub fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.units.lock() {
            guard.push(UnitEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Return `true` if any recorded unit has failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Count the number of failed units.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.units.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.status == UnitStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded units.
    pub fn print_summary(&self) {
        let units = match self.units.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if units.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut ok = 0u32;
        let mut not_applicable = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for unit in &units {
            let (icon, color) = match unit.status {
                UnitStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                UnitStatus::NotApplicable => {
                    not_applicable += 1;
                    ("·", "\x1b[2m")
                }
                UnitStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                UnitStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                UnitStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = unit
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", unit.name));
        }

        println!();
        let total = ok + not_applicable + skipped + dry_run + failed;
        self.info(&format!(
            "{total} units: \x1b[32m{ok} ok\x1b[0m, \x1b[2m{not_applicable} n/a\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>) {
        self.record_unit(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.unit_entries().is_empty(), "expected empty unit list");
    }

    #[test]
    fn record_unit_ok() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_unit("BlackApps.dat", UnitStatus::Ok, None);
        let units = log.unit_entries();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "BlackApps.dat");
        assert_eq!(units[0].status, UnitStatus::Ok);
    }

    #[test]
    fn record_unit_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_unit("NahimicSvc", UnitStatus::Skipped, Some("not installed"));
        assert_eq!(
            log.unit_entries()[0].message,
            Some("not installed".to_string())
        );
    }

    #[test]
    fn has_failures_detects_failed_unit() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(!log.has_failures());
        log.record_unit("a", UnitStatus::Ok, None);
        assert!(!log.has_failures());
        log.record_unit("b", UnitStatus::Failed, Some("error"));
        assert!(log.has_failures());
    }

    #[test]
    fn failure_count_returns_correct_count() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_unit("a", UnitStatus::Ok, None);
        log.record_unit("b", UnitStatus::Failed, Some("error 1"));
        log.record_unit("c", UnitStatus::Failed, Some("error 2"));
        log.record_unit("d", UnitStatus::Skipped, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn log_file_is_created() {
        let (log, _tmp, _guard) = isolated_logger();
        let path = log.log_path().expect("log path should exist");
        assert!(path.exists(), "log file should be created by the file layer");
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let path = log.log_path().expect("log path should exist");
        let contents = fs::read_to_string(path).unwrap();
        assert!(
            contents.contains(&marker),
            "debug messages should always appear in the log file"
        );
    }

    #[test]
    fn stage_written_to_file_with_arrow() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("stage-marker-{}", std::process::id());
        log.stage(&marker);
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("==>"), "stage arrow should appear");
        assert!(contents.contains(&marker));
    }

    #[test]
    fn dry_run_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("dryrun-marker-{}", std::process::id());
        log.dry_run(&marker);
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[dry run]"), "dry run tag should appear");
        assert!(contents.contains(&marker));
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_unit("via-trait", UnitStatus::Ok, None);
        assert_eq!(log.unit_entries().len(), 1);
    }
}
