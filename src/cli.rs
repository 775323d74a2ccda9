//! Command-line argument parsing.
use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI entry point.
///
/// There are no subcommands: the default (and only) action discovers the
/// vendor exclusion lists, merges the known game executables into each one,
/// and restarts the vendor services if anything changed.
#[derive(Parser, Debug)]
#[command(
    name = "blackapps",
    about = "Append known game executables to the A-Volute/Nahimic exclusion lists",
    version
)]
pub struct Cli {
    /// Exclusion list files to update (default: discover under the vendor data root,
    /// or read paths from stdin when piped)
    pub paths: Vec<PathBuf>,

    /// Preview changes without writing files or restarting services
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the vendor data root searched for exclusion lists
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_defaults() {
        let cli = Cli::parse_from(["blackapps"]);
        assert!(cli.paths.is_empty());
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(cli.root.is_none());
    }

    #[test]
    fn parse_dry_run() {
        let cli = Cli::parse_from(["blackapps", "--dry-run"]);
        assert!(cli.dry_run);
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["blackapps", "-d"]);
        assert!(cli.dry_run);
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["blackapps", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_explicit_paths() {
        let cli = Cli::parse_from(["blackapps", "a/BlackApps.dat", "b/BlackApps.dat"]);
        assert_eq!(cli.paths.len(), 2);
        assert_eq!(cli.paths[0], PathBuf::from("a/BlackApps.dat"));
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["blackapps", "--root", "/tmp/avolute"]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/avolute")));
    }

    #[test]
    fn parse_paths_with_flags() {
        let cli = Cli::parse_from(["blackapps", "-d", "lists/BlackApps.dat"]);
        assert!(cli.dry_run);
        assert_eq!(cli.paths.len(), 1);
    }
}
