//! Batch orchestration: resolve targets, merge each list, restart services.
use std::io::{BufRead, IsTerminal as _};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::advisory;
use crate::cli::Cli;
use crate::config::Config;
use crate::discovery;
use crate::error::{MergeError, ServiceError};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger, UnitStatus};
use crate::merge;
use crate::platform::{self, Platform};
use crate::services::{ScController, ServiceController};

/// Aggregated outcome of one batch run.
///
/// Every failure is already reported and recorded by the time this is
/// returned; nothing in a batch is fatal to the run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Whether any list was (or, in dry-run, would be) modified.
    pub any_modified: bool,
    /// Lists that could not be read or written.
    pub files_failed: usize,
    /// Services that exist but could not be restarted.
    pub services_failed: usize,
}

/// Run the default action: discover, merge, restart.
///
/// # Errors
///
/// Practically infallible today — per-unit failures are reported in the
/// summary rather than propagated — but the signature leaves room for
/// setup-stage errors.
pub fn run(args: &Cli, log: &Logger) -> Result<()> {
    let version = option_env!("BLACKAPPS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("blackapps {version}"));

    let config = Config::vendor_default(args.root.clone());
    let platform = Platform::detect();
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);

    if platform::is_elevated(&platform, executor.as_ref()) == Some(false) {
        log.warn(
            "not running as administrator; updating lists under ProgramData will likely fail",
        );
    }
    if let Some(warning) = advisory::driver_warning(&platform, executor.as_ref()) {
        log.warn(&warning);
    }

    let paths = resolve_paths(args, &config, log);
    let controller = ScController::new(Arc::clone(&executor));
    let outcome = execute(&paths, &config, args.dry_run, log, &controller);
    if outcome.files_failed > 0 || outcome.services_failed > 0 {
        log.debug(&format!(
            "{} file unit(s) and {} service unit(s) failed",
            outcome.files_failed, outcome.services_failed
        ));
    }
    log.print_summary();
    Ok(())
}

/// Resolve the target paths for this run, reading stdin only when piped.
fn resolve_paths(args: &Cli, config: &Config, log: &dyn Log) -> Vec<PathBuf> {
    let stdin = std::io::stdin();
    let piped = (!stdin.is_terminal()).then(|| stdin.lock());
    choose_paths(&args.paths, piped, config, log)
}

/// Pick the target set from the three sources in precedence order:
/// explicit CLI positionals, then paths piped on stdin (one per line),
/// then recursive discovery under the configured root.
///
/// A piped reader that yields no paths falls through to discovery.
fn choose_paths(
    explicit: &[PathBuf],
    piped: Option<impl BufRead>,
    config: &Config,
    log: &dyn Log,
) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        log.debug(&format!("using {} explicit path(s)", explicit.len()));
        return explicit.to_vec();
    }
    if let Some(reader) = piped {
        let paths = paths_from_reader(reader);
        if !paths.is_empty() {
            log.debug(&format!("read {} path(s) from stdin", paths.len()));
            return paths;
        }
    }
    log.debug(&format!(
        "searching {} for {}",
        config.root.display(),
        config.file_name
    ));
    discovery::find_lists(&config.root, &config.file_name).collect()
}

/// Parse newline-separated paths from a reader, skipping blank lines.
#[must_use]
pub fn paths_from_reader(reader: impl BufRead) -> Vec<PathBuf> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(PathBuf::from(trimmed))
            }
        })
        .collect()
}

/// Merge the candidate list into every target, then restart the configured
/// services if anything changed.
///
/// Each file and each service is an independent unit: a failure is
/// reported, recorded for the summary, and never stops the siblings.
#[must_use]
pub fn execute(
    paths: &[PathBuf],
    config: &Config,
    dry_run: bool,
    log: &dyn Log,
    services: &dyn ServiceController,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let candidates = config.candidate_refs();

    log.stage("Updating exclusion lists");
    if paths.is_empty() {
        log.info("no exclusion lists found; is the audio suite installed?");
        log.record_unit(
            "exclusion lists",
            UnitStatus::NotApplicable,
            Some("none found"),
        );
        return outcome;
    }

    for path in paths {
        let name = path.display().to_string();
        match merge::merge_file(path, &candidates, dry_run) {
            Ok(merged) if !merged.modified => {
                log.debug(&format!("{name}: already up to date"));
                log.record_unit(&name, UnitStatus::Ok, Some("up to date"));
            }
            Ok(merged) if dry_run => {
                log.dry_run(&format!("{name}: would add {}", merged.added.join(", ")));
                log.record_unit(
                    &name,
                    UnitStatus::DryRun,
                    Some(&format!("would add {}", merged.added.len())),
                );
                outcome.any_modified = true;
            }
            Ok(merged) => {
                log.info(&format!("{name}: added {}", merged.added.join(", ")));
                log.record_unit(
                    &name,
                    UnitStatus::Ok,
                    Some(&format!("added {}", merged.added.len())),
                );
                outcome.any_modified = true;
            }
            Err(e @ MergeError::NotFound(_)) => {
                log.warn(&format!("{e:#}"));
                log.record_unit(&name, UnitStatus::Skipped, Some("not found"));
            }
            Err(e) => {
                log.error(&format!("{e:#}"));
                log.record_unit(&name, UnitStatus::Failed, Some(&format!("{e:#}")));
                outcome.files_failed += 1;
            }
        }
    }

    if !outcome.any_modified {
        log.debug("no lists changed; services left untouched");
        return outcome;
    }

    log.stage("Restarting services");
    for service in &config.services {
        if !services.exists(service) {
            log.info(&format!("{service}: not installed, skipping"));
            log.record_unit(service, UnitStatus::NotApplicable, Some("not installed"));
            continue;
        }
        if dry_run {
            log.dry_run(&format!("would restart {service}"));
            log.record_unit(service, UnitStatus::DryRun, None);
            continue;
        }
        match services.restart(service) {
            Ok(()) => {
                log.info(&format!("{service}: restarted"));
                log.record_unit(service, UnitStatus::Ok, Some("restarted"));
            }
            Err(ServiceError::NotInstalled(_)) => {
                log.info(&format!("{service}: not installed, skipping"));
                log.record_unit(service, UnitStatus::NotApplicable, Some("not installed"));
            }
            Err(e @ ServiceError::RestartFailed { .. }) => {
                log.error(&format!("{e:#}; restart it manually or reboot"));
                log.record_unit(service, UnitStatus::Failed, Some("restart failed"));
                outcome.services_failed += 1;
            }
        }
    }
    outcome
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::logging::isolated_logger;
    use std::fs;
    use std::sync::Mutex;

    /// In-memory service controller for orchestration tests.
    #[derive(Debug, Default)]
    struct FakeController {
        installed: Vec<&'static str>,
        failing: Vec<&'static str>,
        restarted: Mutex<Vec<String>>,
    }

    impl FakeController {
        fn restarted(&self) -> Vec<String> {
            self.restarted.lock().unwrap().clone()
        }
    }

    impl ServiceController for FakeController {
        fn exists(&self, name: &str) -> bool {
            self.installed.contains(&name)
        }

        fn restart(&self, name: &str) -> Result<(), ServiceError> {
            if self.failing.contains(&name) {
                return Err(ServiceError::RestartFailed {
                    service: name.to_string(),
                    detail: "access denied".to_string(),
                });
            }
            self.restarted.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    fn test_config(root: &std::path::Path, candidates: &[&str]) -> Config {
        Config {
            root: root.to_path_buf(),
            file_name: "BlackApps.dat".to_string(),
            candidates: candidates.iter().map(ToString::to_string).collect(),
            services: vec!["NahimicService".to_string(), "NahimicSvc".to_string()],
        }
    }

    #[test]
    fn merges_all_targets_and_restarts_installed_services() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a/BlackApps.dat");
        let b = dir.path().join("b/BlackApps.dat");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, b"old.exe\r\n").unwrap();
        fs::write(&b, b"game.exe\r\n").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController {
            installed: vec!["NahimicService"],
            ..FakeController::default()
        };

        let outcome = execute(
            &[a.clone(), b.clone()],
            &config,
            false,
            &log,
            &controller,
        );

        assert!(outcome.any_modified, "list a gained an entry");
        assert_eq!(outcome.files_failed, 0);
        assert_eq!(fs::read(&a).unwrap(), b"old.exe\r\ngame.exe\r\n");
        assert_eq!(fs::read(&b).unwrap(), b"game.exe\r\n", "b was already complete");
        assert_eq!(
            controller.restarted(),
            vec!["NahimicService".to_string()],
            "only the installed service restarts"
        );
    }

    #[test]
    fn no_restart_when_nothing_changed() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("BlackApps.dat");
        fs::write(&a, b"game.exe\r\n").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController {
            installed: vec!["NahimicService"],
            ..FakeController::default()
        };

        let outcome = execute(&[a], &config, false, &log, &controller);

        assert!(!outcome.any_modified);
        assert!(controller.restarted().is_empty());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("BlackApps.dat");
        fs::write(&a, b"old.exe\r\n").unwrap();
        let before = fs::read(&a).unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController {
            installed: vec!["NahimicService"],
            ..FakeController::default()
        };

        let outcome = execute(&[a.clone()], &config, true, &log, &controller);

        assert!(outcome.any_modified, "dry run still reports 'would modify'");
        assert_eq!(fs::read(&a).unwrap(), before, "file bytes untouched");
        assert!(controller.restarted().is_empty(), "no restarts in dry run");
    }

    #[test]
    fn dry_run_previews_only_installed_services() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("BlackApps.dat");
        fs::write(&a, b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController {
            installed: vec!["NahimicSvc"],
            ..FakeController::default()
        };

        let outcome = execute(&[a], &config, true, &log, &controller);

        assert!(outcome.any_modified);
        let units = log.unit_entries();
        let status_of = |name: &str| units.iter().find(|u| u.name == name).map(|u| u.status);
        assert_eq!(
            status_of("NahimicSvc"),
            Some(UnitStatus::DryRun),
            "installed service is previewed"
        );
        assert_eq!(
            status_of("NahimicService"),
            Some(UnitStatus::NotApplicable),
            "absent service is skipped in the preview too"
        );
        assert!(controller.restarted().is_empty());
    }

    #[test]
    fn explicit_paths_win_over_piped_input() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let explicit = vec![PathBuf::from("explicit/BlackApps.dat")];

        let paths = choose_paths(
            &explicit,
            Some(&b"/piped/BlackApps.dat\n"[..]),
            &config,
            &log,
        );

        assert_eq!(paths, explicit);
    }

    #[test]
    fn piped_paths_win_over_discovery() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        // A discoverable list under the root that must be ignored.
        fs::write(dir.path().join("BlackApps.dat"), b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);

        let paths = choose_paths(&[], Some(&b"/piped/BlackApps.dat\n"[..]), &config, &log);

        assert_eq!(paths, vec![PathBuf::from("/piped/BlackApps.dat")]);
    }

    #[test]
    fn blank_piped_input_falls_through_to_discovery() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BlackApps.dat"), b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);

        let paths = choose_paths(&[], Some(&b"\n   \n"[..]), &config, &log);

        assert_eq!(paths, vec![dir.path().join("BlackApps.dat")]);
    }

    #[test]
    fn no_piped_input_falls_through_to_discovery() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BlackApps.dat"), b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);

        let paths = choose_paths(&[], None::<&[u8]>, &config, &log);

        assert_eq!(paths, vec![dir.path().join("BlackApps.dat")]);
    }

    #[test]
    fn missing_sibling_does_not_stop_the_batch() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent/BlackApps.dat");
        let present = dir.path().join("BlackApps.dat");
        fs::write(&present, b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController::default();

        let outcome = execute(
            &[missing, present.clone()],
            &config,
            false,
            &log,
            &controller,
        );

        assert!(outcome.any_modified, "the present sibling was still merged");
        assert_eq!(outcome.files_failed, 0, "a missing file is a skip, not a failure");
        assert_eq!(fs::read(&present).unwrap(), b"game.exe\r\n");
    }

    #[test]
    fn unreadable_target_counts_as_failed_but_siblings_proceed() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        // A directory with the list's name: exists, but reads fail.
        let unreadable = dir.path().join("BlackApps.dat");
        fs::create_dir(&unreadable).unwrap();
        let sibling = dir.path().join("sub/BlackApps.dat");
        fs::create_dir_all(sibling.parent().unwrap()).unwrap();
        fs::write(&sibling, b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController::default();

        let outcome = execute(
            &[unreadable, sibling.clone()],
            &config,
            false,
            &log,
            &controller,
        );

        assert_eq!(outcome.files_failed, 1);
        assert_eq!(fs::read(&sibling).unwrap(), b"game.exe\r\n");
    }

    #[test]
    fn restart_failure_is_reported_not_fatal() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("BlackApps.dat");
        fs::write(&a, b"").unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController {
            installed: vec!["NahimicService", "NahimicSvc"],
            failing: vec!["NahimicService"],
            ..FakeController::default()
        };

        let outcome = execute(&[a], &config, false, &log, &controller);

        assert_eq!(outcome.services_failed, 1);
        assert_eq!(
            controller.restarted(),
            vec!["NahimicSvc".to_string()],
            "the healthy service still restarts after the failed one"
        );
    }

    #[test]
    fn empty_target_set_is_not_applicable() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["game.exe"]);
        let controller = FakeController::default();

        let outcome = execute(&[], &config, false, &log, &controller);

        assert_eq!(outcome, BatchOutcome::default());
        assert!(controller.restarted().is_empty());
    }

    #[test]
    fn paths_from_reader_skips_blank_lines() {
        let input = b"/a/BlackApps.dat\n\n  \n/b/BlackApps.dat\n";
        let paths = paths_from_reader(&input[..]);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/a/BlackApps.dat"),
                PathBuf::from("/b/BlackApps.dat")
            ]
        );
    }

    #[test]
    fn paths_from_reader_empty_input() {
        assert!(paths_from_reader(&b""[..]).is_empty());
    }
}
