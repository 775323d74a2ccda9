//! Binary entry point for the `blackapps` CLI.
use anyhow::Result;
use clap::Parser;

use blackapps_cli::{cli, logging, run};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, "run");
    let log = logging::Logger::new("run");
    run::run(&args, &log)
}
