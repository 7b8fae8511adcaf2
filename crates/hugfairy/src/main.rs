//! hugfairy - Hashtag reply bot CLI
//!
//! Polls the configured hashtag search and replies to each new post's
//! author with a templated message mentioning them.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("hugfairy=info".parse()?)
                .add_directive("hugfairy_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Run { dry_run } => {
            commands::run::execute(&config, cli.identifier, cli.password, dry_run).await
        }
        Commands::Login => commands::login::execute(&config, cli.identifier, cli.password).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("hugfairy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
