// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ferry - incremental outbound message export.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod reschedule;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ferry_config::FerryConfig;

/// Ferry - export new messages to a remote collector on a schedule.
#[derive(Parser, Debug)]
#[command(name = "ferry", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the resident export service.
    Serve,
    /// Run a single export scan and exit.
    RunOnce,
    /// Show checkpoint, wake plan and recent runs.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
        /// Number of recent runs to show.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Discard the stored wake plan and schedule from now.
    Reschedule,
}

fn load_config(path: Option<&PathBuf>) -> FerryConfig {
    let loaded = match path {
        Some(path) => ferry_config::load_and_validate_path(path),
        None => ferry_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            ferry_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("ferry: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_ref());

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::RunOnce => serve::run_once(config).await,
        Commands::Status { json, plain, limit } => {
            status::run_status(&config, json, plain, limit).await
        }
        Commands::Reschedule => reschedule::run_reschedule(&config).await,
    };

    if let Err(e) = result {
        eprintln!("ferry: {e}");
        std::process::exit(1);
    }
}
