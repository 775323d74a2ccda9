//! Service lifecycle glue behind a small capability trait.
use std::sync::Arc;

use crate::error::ServiceError;
use crate::exec::Executor;

/// Windows error code reported by `sc` when a service does not exist.
const ERROR_SERVICE_DOES_NOT_EXIST: &str = "1060";

/// Capability interface for the service-restart collaborator.
///
/// The merge core and orchestrator only ever talk to this trait, so tests
/// run against an in-memory fake instead of the real service manager.
pub trait ServiceController: Send + Sync {
    /// Whether a service with this name is installed on the host.
    fn exists(&self, name: &str) -> bool;

    /// Request a forced restart of the named service.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotInstalled`] when the service is absent (callers
    /// treat this as an informational skip) and
    /// [`ServiceError::RestartFailed`] when the service exists but the
    /// restart call failed.
    fn restart(&self, name: &str) -> Result<(), ServiceError>;
}

/// Production [`ServiceController`] backed by `sc` and PowerShell.
///
/// Presence is probed with `sc query`, whose output carries Windows error
/// 1060 for unknown services. Restarts go through PowerShell's
/// `Restart-Service -Force` so dependent services are bounced too — a plain
/// `sc stop`/`sc start` pair leaves the injector half-attached.
#[derive(Clone)]
pub struct ScController {
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for ScController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScController").finish_non_exhaustive()
    }
}

impl ScController {
    /// Create a controller that spawns through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl ServiceController for ScController {
    fn exists(&self, name: &str) -> bool {
        self.executor
            .run_unchecked("sc", &["query", name])
            .is_ok_and(|r| r.success)
    }

    fn restart(&self, name: &str) -> Result<(), ServiceError> {
        let script = format!("Restart-Service -Name '{name}' -Force -ErrorAction Stop");
        let result = self
            .executor
            .run_unchecked("powershell", &["-NoProfile", "-Command", &script])
            .map_err(|e| ServiceError::RestartFailed {
                service: name.to_string(),
                detail: format!("{e:#}"),
            })?;
        if result.success {
            return Ok(());
        }
        let detail = if result.stderr.trim().is_empty() {
            format!("exit code {}", result.code.unwrap_or(-1))
        } else {
            result.stderr.trim().to_string()
        };
        if detail.contains(ERROR_SERVICE_DOES_NOT_EXIST) || detail.contains("NoServiceFoundForGivenName")
        {
            return Err(ServiceError::NotInstalled(name.to_string()));
        }
        Err(ServiceError::RestartFailed {
            service: name.to_string(),
            detail,
        })
    }
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
    use crate::exec::test_helpers::MockExecutor;

    fn controller(mock: MockExecutor) -> ScController {
        ScController::new(Arc::new(mock))
    }

    #[test]
    fn exists_true_when_query_succeeds() {
        let mock = MockExecutor::ok("SERVICE_NAME: NahimicService\n    STATE : 4 RUNNING");
        assert!(controller(mock).exists("NahimicService"));
    }

    #[test]
    fn exists_false_when_query_fails() {
        let mock = MockExecutor::fail(
            "[SC] EnumQueryServicesStatus:OpenService FAILED 1060:\nThe specified service does not exist.",
        );
        assert!(!controller(mock).exists("NahimicService"));
    }

    #[test]
    fn exists_false_when_sc_cannot_spawn() {
        assert!(!controller(MockExecutor::unspawnable()).exists("NahimicService"));
    }

    #[test]
    fn restart_success() {
        let mock = MockExecutor::ok("");
        controller(mock).restart("NahimicService").unwrap();
    }

    #[test]
    fn restart_issues_forced_powershell_restart() {
        let mock = MockExecutor::ok("");
        let mock_ref = Arc::new(mock);
        let ctl = ScController::new(Arc::clone(&mock_ref) as Arc<dyn Executor>);
        ctl.restart("NahimicSvc").unwrap();
        let calls = mock_ref.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("powershell -NoProfile -Command"));
        assert!(calls[0].contains("Restart-Service -Name 'NahimicSvc' -Force"));
    }

    #[test]
    fn restart_missing_service_is_not_installed() {
        let mock = MockExecutor::fail(
            "Restart-Service : Cannot find any service with service name 'NahimicSvc'.\n+ FullyQualifiedErrorId : NoServiceFoundForGivenName",
        );
        let err = controller(mock).restart("NahimicSvc").unwrap_err();
        assert!(matches!(err, ServiceError::NotInstalled(_)), "got: {err}");
    }

    #[test]
    fn restart_failure_carries_stderr_detail() {
        let mock = MockExecutor::fail("Cannot open NahimicService service on computer '.'.");
        let err = controller(mock).restart("NahimicService").unwrap_err();
        match err {
            ServiceError::RestartFailed { service, detail } => {
                assert_eq!(service, "NahimicService");
                assert!(detail.contains("Cannot open"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn restart_failure_without_stderr_reports_exit_code() {
        let mock = MockExecutor::with_responses(vec![(false, String::new(), String::new())]);
        let err = controller(mock).restart("NahimicService").unwrap_err();
        assert!(err.to_string().contains("exit code"), "got: {err}");
    }
}
