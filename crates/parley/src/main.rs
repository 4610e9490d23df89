// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - AI-assisted customer support chat.
//!
//! This is the binary entry point for the Parley server.

mod app;
mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::{ConfigError, ParleyConfig};

/// Parley - AI-assisted customer support chat.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the default search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat server.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
    /// Send a test prompt to the configured AI model.
    TestAi,
    /// Build the knowledge base once and report its size.
    RebuildKnowledge,
}

fn load_config(path: Option<&PathBuf>) -> Result<ParleyConfig, Vec<ConfigError>> {
    match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("parley: use --help for available commands");
        return;
    };

    // Load and validate configuration at startup
    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.server.log_level);

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CheckConfig => {
            println!("configuration OK\n{}", commands::config_summary(&config));
            Ok(())
        }
        Commands::TestAi => commands::test_ai(&config).await.map(|report| println!("{report}")),
        Commands::RebuildKnowledge => commands::rebuild_knowledge(&config)
            .await
            .map(|report| println!("{report}")),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
