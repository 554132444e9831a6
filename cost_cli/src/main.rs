//! # Sectio CLI Application
//!
//! Terminal front end for the homogeneous-sections cost allocation engine.
//!
//! Usage:
//!   sectio calc <file>          Validate and compute a project
//!   sectio validate <file>      Report key and section problems
//!   sectio demo [-s tutorial]   Run a built-in example
//!   sectio init <file>          Write a starting project
//!
//! Logs go to stderr (`-v`, `-vv`, or `RUST_LOG`); results go to stdout.

mod cli;
mod commands;
mod config;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::AppConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path)?
    } else {
        AppConfig::load().unwrap_or_default()
    };
    tracing::debug!(?config, "configuration loaded");

    commands::run(cli, config)
}
