// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gauntlet -- autonomous runner for chained web quiz stages.
//!
//! This is the binary entry point for the Gauntlet service.

use clap::{Parser, Subcommand};

mod serve;

/// Gauntlet -- autonomous runner for chained web quiz stages.
#[derive(Parser, Debug)]
#[command(name = "gauntlet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Gauntlet gateway server.
    Serve,
    /// Solve one quiz chain from the command line and print the report.
    Run {
        /// First stage URL.
        #[arg(long)]
        url: String,
        /// Identity to solve for (email or similar).
        #[arg(long)]
        identity: String,
        /// Shared secret expected by the quiz board.
        #[arg(long)]
        secret: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match gauntlet_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            for error in &errors {
                eprintln!("gauntlet: config error: {error}");
            }
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.runner.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Run {
            url,
            identity,
            secret,
        }) => serve::run_once(config, url, identity, secret).await,
        None => {
            println!("gauntlet: use --help for available commands");
            Ok(())
        }
    };

    if let Err(error) = result {
        eprintln!("gauntlet: {error}");
        std::process::exit(1);
    }
}
