// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fincabot - an automated WhatsApp sales agent for vacation rentals.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Fincabot - an automated WhatsApp sales agent for vacation rentals.
#[derive(Parser, Debug)]
#[command(name = "fincabot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway and inbound pipeline.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match fincabot_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fincabot: configuration error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("fincabot: {e}");
                std::process::exit(1);
            }
        }
    }
}
