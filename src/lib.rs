//! Exclusion-list updater for the A-Volute/Nahimic audio service suite.
//!
//! The service injects into running games and is a well-known source of
//! stutter; executables listed in its `BlackApps.dat` files are left alone.
//! This crate discovers every exclusion list under the vendor data root,
//! merges a fixed set of known game executables into each one (idempotent,
//! case-insensitive, order-preserving), and force-restarts the vendor
//! services when anything changed.
//!
//! The public API is organised into thin layers:
//!
//! - **[`merge`]** — the idempotent read–merge–write core
//! - **[`discovery`]** — recursive search for exclusion lists
//! - **[`services`]**, **[`platform`]**, **[`advisory`]** — OS glue behind
//!   small capability traits so the core stays testable
//! - **[`run`]** — batch orchestration wired to the CLI
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod advisory;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod logging;
pub mod merge;
pub mod platform;
pub mod run;
pub mod services;
