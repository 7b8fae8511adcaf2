//! Forced credential login.
//!
//! Performs a fresh createSession and persists the exported session,
//! replacing whatever the session file held.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use hugfairy_core::agent::AgentBuilder;
use hugfairy_core::session::{SessionStore, persist_hook};

pub async fn execute(
    config: &Config,
    identifier: Option<String>,
    password: Option<String>,
) -> Result<()> {
    config.ensure_dirs()?;

    let store = SessionStore::new(&config.paths.session_file);
    let credentials = config.credentials(identifier, password)?;

    let agent = AgentBuilder::new(&config.service.url)?
        .on_session_change(persist_hook(store.clone()))
        .login(&credentials)
        .await
        .context("Login failed")?;

    let session = agent.session();
    println!(
        "{} Logged in as {} ({})",
        "✓".green(),
        session.handle.cyan(),
        session.did
    );
    println!("  Session saved to {}", store.path().display());

    Ok(())
}
