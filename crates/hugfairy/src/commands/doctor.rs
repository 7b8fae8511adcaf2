//! Diagnostics command.

use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::fs;
use std::os::unix::fs::PermissionsExt;

use crate::config::Config;
use hugfairy_core::cursor::CursorStore;
use hugfairy_core::session::SessionStore;
use hugfairy_core::template::TemplateSet;
use hugfairy_core::xrpc::XrpcClient;

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "hugfairy Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check data directory
    print!("  Data directory: ");
    if config.paths.data_dir.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ will be created".yellow());
    }

    // Check templates
    print!("  Templates: ");
    match TemplateSet::load(&config.templates.path) {
        Ok(set) => println!("{}", format!("✓ {} loaded", set.len()).green()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Templates file missing or invalid");
        }
    }

    // Check cursor file
    print!("  Cursor file: ");
    let cursor = CursorStore::new(&config.paths.cursor_file);
    match cursor.load() {
        Ok(marker) => println!("{}", format!("✓ marker {}", marker).green()),
        Err(_) => {
            println!("{}", "✗ not found".red());
            println!(
                "    Seed it with the CID of the newest already-answered post: {}",
                format!("echo <cid> > {}", cursor.path().display()).cyan()
            );
            issues.push("Cursor file missing - a run would fail");
        }
    }

    // Check session file
    print!("  Session: ");
    let session_store = SessionStore::new(&config.paths.session_file);
    match session_store.load() {
        Ok(Some(session)) => {
            println!("{}", format!("✓ stored for @{}", session.handle).green());

            let metadata = fs::metadata(session_store.path())?;
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 {
                println!("    {} permissions {:o}, expected 600", "○".yellow(), mode);
            }

            print!("    Access token: ");
            match token_expiry(&session.access_jwt) {
                Some(exp) if exp > Utc::now() => {
                    println!("{}", format!("✓ valid until {}", exp.to_rfc3339()).green())
                }
                Some(_) => println!("{}", "○ expired (will refresh)".yellow()),
                None => println!("{}", "○ unreadable expiry".yellow()),
            }
        }
        Ok(None) => println!("{}", "○ none (will login with credentials)".yellow()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Session file unreadable");
        }
    }

    // Check service reachability
    print!("  Service ({}): ", config.service.url);
    match check_service(&config.service.url).await {
        Ok(_) => println!("{}", "✓ reachable".green()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Cannot reach the PDS");
        }
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}

async fn check_service(url: &str) -> Result<()> {
    let client = XrpcClient::new(url)?;
    client.describe_server().await?;
    Ok(())
}

/// Decode the `exp` claim of a JWT without verifying it.
/// Returns None for anything that does not look like a JWT.
fn token_expiry(jwt: &str) -> Option<DateTime<Utc>> {
    let payload = jwt.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_token_expiry_reads_exp_claim() {
        let exp = token_expiry(&jwt_with_exp(1893456000)).unwrap();
        assert_eq!(exp.timestamp(), 1893456000);
    }

    #[test]
    fn test_token_expiry_rejects_garbage() {
        assert!(token_expiry("not-a-jwt").is_none());
        assert!(token_expiry("a.%%%.c").is_none());
    }
}
