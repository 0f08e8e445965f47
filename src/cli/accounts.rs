//! Account CLI command handlers

use std::path::PathBuf;

use crate::api::gateway::RemoteGateway;
use crate::api::models::AccountKind;
use crate::cli::commands::AccountsCommand;
use crate::cli::context::AppContext;
use crate::cli::repos::{status_icon, truncate};
use crate::core::sync;
use crate::error::Result;

/// Handle account commands
pub async fn handle_accounts(command: AccountsCommand, data_dir: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(data_dir)?;
    let mut credentials = ctx.credentials()?;
    let gateway = ctx.gateway(&credentials)?;

    match command {
        AccountsCommand::List => {
            let accounts = sync::refresh_account(&gateway, &mut credentials).await?;

            println!("  {:<25}  {:<30}  {:<12}  {:>5}", "LOGIN", "NAME", "TYPE", "REPOS");
            println!("  {}", "-".repeat(78));
            for account in &accounts {
                let kind = match account.kind {
                    AccountKind::User => "user",
                    AccountKind::Organization => "organization",
                };
                println!(
                    "  {:<25}  {:<30}  {:<12}  {:>5}",
                    truncate(&account.login, 25),
                    truncate(&account.name, 30),
                    kind,
                    account.repos_count
                );
            }
            Ok(())
        }
        AccountsCommand::Repos { owner } => {
            let member = credentials
                .account_profile()
                .map(|p| p.login.clone())
                .unwrap_or_else(|| owner.clone());

            let repos = gateway.fetch_owner_repos(&owner, &member).await?;
            if repos.is_empty() {
                println!("No active repositories for {}.", owner);
                return Ok(());
            }

            for repo in &repos {
                println!(
                    "  {}  {:<40}  {}",
                    status_icon(repo.build.state()),
                    truncate(&repo.slug, 40),
                    repo.build.duration_text()
                );
            }
            Ok(())
        }
    }
}
