//! Advisory check for known-broken vendor driver versions.
//!
//! Some A-Volute device-driver builds ignore the exclusion list entirely, so
//! a successful merge on those machines changes nothing the user can feel.
//! This check is purely informational: it never blocks the merge, and any
//! failure — query, parse, anything — degrades to "no warning".
use crate::exec::Executor;
use crate::platform::Platform;

/// First driver version whose exclusion handling is known to be broken.
const BROKEN_FROM: [u32; 4] = [1, 4, 1, 0];
/// First driver version where exclusion handling works again.
const BROKEN_UNTIL: [u32; 4] = [1, 4, 4, 0];

/// PowerShell query for the installed A-Volute/Nahimic driver versions.
const DRIVER_QUERY: &str = "Get-CimInstance Win32_PnPSignedDriver | \
     Where-Object { $_.DeviceName -like '*A-Volute*' -or $_.DeviceName -like '*Nahimic*' } | \
     Select-Object -ExpandProperty DriverVersion";

/// Parse a dotted driver version leniently.
///
/// Returns `None` for anything that is not a plain dotted number sequence.
/// Callers ignore `None` silently — an unparseable version must never be
/// escalated to an error.
fn parse_version(s: &str) -> Option<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

fn is_broken(version: &[u32]) -> bool {
    version >= &BROKEN_FROM[..] && version < &BROKEN_UNTIL[..]
}

/// Inspect the installed driver versions and return a warning message when
/// a known-broken one is found.
///
/// Returns `None` on non-Windows platforms, when the query fails, when no
/// vendor driver is present, and when every reported version is fine.
#[must_use]
pub fn driver_warning(platform: &Platform, executor: &dyn Executor) -> Option<String> {
    if !platform.is_windows() {
        return None;
    }
    let result = executor
        .run_unchecked("powershell", &["-NoProfile", "-Command", DRIVER_QUERY])
        .ok()?;
    if !result.success {
        return None;
    }
    for line in result.stdout.lines() {
        let Some(version) = parse_version(line) else {
            continue;
        };
        if is_broken(&version) {
            return Some(format!(
                "installed audio driver {} is known to ignore the exclusion list; \
                 update the driver for the changes to take effect",
                line.trim()
            ));
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::platform::Os;

    #[test]
    fn parse_version_accepts_dotted_numbers() {
        assert_eq!(parse_version("1.4.2.0"), Some(vec![1, 4, 2, 0]));
        assert_eq!(parse_version(" 2.0 "), Some(vec![2, 0]));
    }

    #[test]
    fn parse_version_rejects_garbage_silently() {
        assert_eq!(parse_version(""), None);
        assert_eq!(parse_version("   "), None);
        assert_eq!(parse_version("1.4.x"), None);
        assert_eq!(parse_version("not a version"), None);
    }

    #[test]
    fn broken_range_is_half_open() {
        assert!(!is_broken(&[1, 4, 0, 9]));
        assert!(is_broken(&[1, 4, 1, 0]));
        assert!(is_broken(&[1, 4, 3, 7]));
        assert!(!is_broken(&[1, 4, 4, 0]));
        assert!(!is_broken(&[1, 5, 0, 0]));
    }

    #[test]
    fn short_versions_compare_lexicographically() {
        assert!(is_broken(&[1, 4, 2]));
        assert!(!is_broken(&[1, 4]));
    }

    #[test]
    fn warns_on_broken_version() {
        let executor = MockExecutor::ok("1.4.2.0\n");
        let warning = driver_warning(&Platform::new(Os::Windows), &executor);
        assert!(warning.is_some());
        assert!(warning.unwrap().contains("1.4.2.0"));
    }

    #[test]
    fn silent_on_healthy_version() {
        let executor = MockExecutor::ok("1.5.0.0\n");
        assert_eq!(driver_warning(&Platform::new(Os::Windows), &executor), None);
    }

    #[test]
    fn silent_on_unparseable_output() {
        let executor = MockExecutor::ok("DriverVersion\n-------------\ngarbage\n");
        assert_eq!(driver_warning(&Platform::new(Os::Windows), &executor), None);
    }

    #[test]
    fn silent_when_query_fails() {
        let executor = MockExecutor::fail("not recognized");
        assert_eq!(driver_warning(&Platform::new(Os::Windows), &executor), None);
    }

    #[test]
    fn silent_when_powershell_cannot_spawn() {
        let executor = MockExecutor::unspawnable();
        assert_eq!(driver_warning(&Platform::new(Os::Windows), &executor), None);
    }

    #[test]
    fn not_applicable_off_windows() {
        let executor = MockExecutor::ok("1.4.2.0\n");
        assert_eq!(driver_warning(&Platform::new(Os::Linux), &executor), None);
        assert!(executor.calls().is_empty());
    }
}
