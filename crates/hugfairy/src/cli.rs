//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Hashtag reply bot
///
/// Searches the configured tag for new posts and replies to each author
/// with a templated message mentioning them.
#[derive(Parser, Debug)]
#[command(name = "hugfairy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Account identifier (handle or DID)
    #[arg(long, env = "HUGFAIRY_IDENTIFIER", global = true)]
    pub identifier: Option<String>,

    /// Account app password
    #[arg(long, env = "HUGFAIRY_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for new tagged posts and reply to each author
    Run {
        /// Render replies without publishing or advancing the cursor
        #[arg(long)]
        dry_run: bool,
    },

    /// Force a credential login and replace the stored session
    Login,

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}
