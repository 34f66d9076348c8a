//! Fail-fast machine provisioning.
//!
//! Provisions a fresh apt-based Linux machine from `conf/provision.toml`:
//! apt and snap packages, program recipes, post-install configuration,
//! wallpaper downloads, and cleanup. Every external command runs under a
//! timeout and can be interrupted; known-benign diagnostics (such as apt's
//! CLI stability warning) are stripped from error output before deciding
//! whether a command failed.
//!
//! The public API is organised into layers:
//!
//! - **[`exec`]**, **[`sanitize`]**, **[`outcome`]**: run one command,
//!   clean its error output, and classify the result
//! - **[`config`]**: parse and validate the TOML configuration
//! - **[`steps`]**: named steps and the fail-fast orchestrator
//! - **[`commands`]**: top-level subcommands (`install`, `list`, `exec`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod outcome;
/// Platform detection.
pub mod platform;
pub mod sanitize;
pub mod steps;
