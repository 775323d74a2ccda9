//! Core logging types: unit entries, status, and the [`Log`] trait.

/// Per-unit result (one exclusion list or one service) for summary reporting.
#[derive(Debug, Clone)]
pub struct UnitEntry {
    /// Human-readable unit name (file path or service name).
    pub name: String,
    /// Final status of the unit.
    pub status: UnitStatus,
    /// Optional detail message (e.g., what was added, or why it failed).
    pub message: Option<String>,
}

/// Status of a processed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Unit was processed successfully.
    Ok,
    /// Unit does not apply to this machine (e.g., service not installed).
    NotApplicable,
    /// Unit was explicitly skipped.
    Skipped,
    /// Unit ran in dry-run mode; no changes were applied.
    DryRun,
    /// Unit encountered an error and could not complete.
    Failed,
}

/// Abstraction over logging backends so orchestration code can be tested
/// against [`Logger`](super::logger::Logger) without a live console.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a unit result for the summary.
    fn record_unit(&self, name: &str, status: UnitStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn unit_status_equality() {
        assert_eq!(UnitStatus::Ok, UnitStatus::Ok);
        assert_ne!(UnitStatus::Ok, UnitStatus::Failed);
        assert_ne!(UnitStatus::Skipped, UnitStatus::DryRun);
    }

    #[test]
    fn unit_entry_clone() {
        let entry = UnitEntry {
            name: "BlackApps.dat".to_string(),
            status: UnitStatus::Ok,
            message: Some("added 2 entries".to_string()),
        };
        let cloned = entry.clone();
        assert_eq!(cloned.name, entry.name);
        assert_eq!(cloned.status, entry.status);
        assert_eq!(cloned.message, entry.message);
    }
}
