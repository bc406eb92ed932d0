// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dealcast - scheduled product promotions for messaging channels.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod campaign;
mod maintenance;
mod serve;
mod status;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dealcast_config::model::DealcastConfig;

use crate::campaign::{CampaignCommand, TimingCommand};

/// Dealcast - scheduled product promotions for messaging channels.
#[derive(Parser, Debug)]
#[command(name = "dealcast", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the posting scheduler and discovery cycle until interrupted.
    Serve,
    /// Show campaign and storage status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Manage campaigns.
    #[command(subcommand)]
    Campaign(CampaignCommand),
    /// Manage campaign posting windows.
    #[command(subcommand)]
    Timing(TimingCommand),
    /// Run one discovery cycle now.
    Discover,
    /// Purge expired queue rows and posting log entries.
    Cleanup,
}

fn load_config(path: Option<&PathBuf>) -> DealcastConfig {
    let loaded = match path {
        Some(path) => dealcast_config::load_and_validate_path(path),
        None => dealcast_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            dealcast_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    serve::init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await.map(|()| None),
        Commands::Status { json } => status::run_status(&config, json).await.map(|()| None),
        Commands::Campaign(command) => campaign::run_campaign(&config, command).await.map(Some),
        Commands::Timing(command) => campaign::run_timing(&config, command).await.map(Some),
        Commands::Discover => maintenance::run_discover(&config).await.map(Some),
        Commands::Cleanup => maintenance::run_cleanup(&config).await.map(Some),
    };

    match result {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
