//! Authentication CLI command handlers

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::Command;

use crate::api::auth::{authorize_url, new_state_token, parse_callback};
use crate::cli::commands::AuthCommand;
use crate::cli::context::{AppContext, Credentials};
use crate::core::credentials::mask_token;
use crate::core::handshake::{AuthHandshake, HandshakeEvent};
use crate::core::sync;
use crate::error::{BuildTrackerError, Result};

/// Handle authentication commands
pub async fn handle_auth(command: AuthCommand, data_dir: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(data_dir)?;
    match command {
        AuthCommand::Login { state } => handle_login(&ctx, state).await,
        AuthCommand::Logout => handle_logout(&ctx),
        AuthCommand::Status => handle_status(&ctx),
    }
}

/// Handle the login command using the GitHub web flow
async fn handle_login(ctx: &AppContext, state: Option<String>) -> Result<()> {
    let mut credentials = ctx.credentials()?;

    if credentials.is_authenticated() {
        println!("✓ Already authenticated with Travis CI.");
        println!();
        println!("  To re-authenticate, first run: bt auth logout");
        return Ok(());
    }

    ctx.config.require_client_id()?;
    let gateway = ctx.anonymous_gateway()?;
    let state_token = state.unwrap_or_else(new_state_token);
    let url = authorize_url(&ctx.config, &state_token)?;

    {
        let mut handshake = AuthHandshake::new(&gateway, &mut credentials);
        let mut events = handshake.subscribe();
        handshake.begin(state_token)?;

        println!("Starting GitHub authentication...\n");
        println!("Open this URL in your browser:");
        println!("  {}", url);
        println!();

        if open_browser(url.as_str()) {
            println!("✓ Browser opened automatically.");
            println!();
        }

        println!("After authorizing, paste the URL you were redirected to.");
        print!("Redirect URL: ");
        io::stdout().flush()?;

        let redirect = read_line()?;
        let callback = parse_callback(&redirect)?;

        println!();
        println!("Exchanging tokens...");
        let outcome = handshake.complete(&callback.code, &callback.state).await;

        if let Ok(HandshakeEvent::Failed(reason)) = events.try_recv() {
            tracing::info!(%reason, "login failed");
        }
        outcome?;
    }

    let gateway = ctx.gateway(&credentials)?;
    if let Err(e) = sync::refresh_account(&gateway, &mut credentials).await {
        tracing::warn!(error = %e, "could not fetch account profile");
    }

    println!();
    match credentials.account_profile() {
        Some(profile) => println!("✓ Logged in as @{}", profile.login),
        None => println!("✓ Successfully authenticated with Travis CI!"),
    }
    Ok(())
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        return Err(BuildTrackerError::InvalidInput(
            "No redirect URL provided".to_string(),
        ));
    }
    Ok(line)
}

/// Try to open a URL in the default browser
fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn().is_ok()
    }

    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open").arg(url).spawn().is_ok()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = url;
        false
    }
}

/// Handle the logout command
///
/// Tracked repositories belong to the account, so they go too.
fn handle_logout(ctx: &AppContext) -> Result<()> {
    let mut credentials = ctx.credentials()?;
    let was_authenticated = credentials.is_authenticated();

    credentials.logout()?;
    ctx.repos()?.remove_all()?;

    if was_authenticated {
        println!("Successfully logged out.");
    } else {
        println!("Not currently authenticated.");
    }
    Ok(())
}

/// Handle the status command
fn handle_status(ctx: &AppContext) -> Result<()> {
    let credentials = ctx.credentials()?;

    println!("Authentication Status:");
    println!(
        "  Travis CI: {}",
        if credentials.is_authenticated() {
            "Authenticated"
        } else {
            "Not authenticated"
        }
    );
    println!("  Credential backend: {}", ctx.config.credential_backend);

    if credentials.is_authenticated() {
        print_tokens(&credentials);
    }

    let tracked = ctx.repos()?.len();
    println!("\n  Tracked repositories: {}", tracked);
    Ok(())
}

fn print_tokens(credentials: &Credentials) {
    if let Some(profile) = credentials.account_profile() {
        println!("  Account: @{} ({})", profile.login, profile.name);
    }
    if let Some(token) = credentials.source_host_token() {
        println!(
            "\n  GitHub token: {} (scope: {})",
            mask_token(&token.token),
            token.scope
        );
    }
    if let Some(token) = credentials.ci_token() {
        println!("  Travis token: {}", mask_token(&token.token));
    }
}
