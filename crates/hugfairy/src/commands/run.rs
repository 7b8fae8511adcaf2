//! The main bot run: authenticate, reply to new tagged posts, ping.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, info};

use crate::config::Config;
use hugfairy_core::agent::Agent;
use hugfairy_core::cursor::CursorStore;
use hugfairy_core::deliver::Delivery;
use hugfairy_core::session::SessionStore;
use hugfairy_core::template::TemplateSet;

pub async fn execute(
    config: &Config,
    identifier: Option<String>,
    password: Option<String>,
    dry_run: bool,
) -> Result<()> {
    info!("Starting bot....");
    config.ensure_dirs()?;

    let templates = TemplateSet::load(&config.templates.path)
        .with_context(|| format!("Failed to load templates from {}", config.templates.path.display()))?;
    let selector = config.selector()?;

    let session_store = SessionStore::new(&config.paths.session_file);
    let cursor = CursorStore::new(&config.paths.cursor_file);
    let credentials = config.credentials(identifier, password)?;

    let agent = Agent::init(&config.service.url, &session_store, &credentials)
        .await
        .context("Failed to authenticate")?;

    let delivery = Delivery::new(
        &agent,
        &templates,
        selector,
        &cursor,
        &config.search.tag,
        config.search.limit,
    )
    .dry_run(dry_run);

    let outcome = delivery.run().await;

    // The completion ping goes out whether or not the run succeeded
    ping_healthcheck(config).await;

    let report = outcome.context("Run aborted")?;
    if dry_run {
        println!("{} Dry run complete, nothing published", "✓".green());
    } else {
        println!(
            "{} {} replies sent as @{}",
            "✓".green(),
            report.sent,
            agent.session().handle
        );
    }

    Ok(())
}

/// Best-effort GET against the configured health-check endpoint.
/// The response is discarded and failures are swallowed.
async fn ping_healthcheck(config: &Config) {
    let Some(url) = config.healthcheck.url.as_deref() else {
        return;
    };

    debug!("Pinging health-check endpoint");
    match reqwest::get(url).await {
        Ok(_) => {}
        Err(e) => debug!("Health-check ping failed: {}", e),
    }
}
