//! Build CLI command handlers

use std::path::PathBuf;

use crate::api::gateway::RemoteGateway;
use crate::cli::commands::BuildsCommand;
use crate::cli::context::AppContext;
use crate::cli::repos::{status_icon, truncate};
use crate::error::Result;

/// Handle build commands
pub async fn handle_builds(command: BuildsCommand, data_dir: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(data_dir)?;
    let credentials = ctx.credentials()?;
    let gateway = ctx.gateway(&credentials)?;

    match command {
        BuildsCommand::List { slug, limit } => handle_list(&gateway, &slug, limit).await,
        BuildsCommand::Restart { build_id } => {
            gateway.restart_build(build_id).await?;
            println!("✓ Restarted build {}", build_id);
            Ok(())
        }
        BuildsCommand::Cancel { build_id } => {
            gateway.cancel_build(build_id).await?;
            println!("✓ Cancelled build {}", build_id);
            Ok(())
        }
    }
}

async fn handle_list<G: RemoteGateway + ?Sized>(gateway: &G, slug: &str, limit: usize) -> Result<()> {
    let list = gateway.fetch_build_status(slug).await?;

    if list.builds.is_empty() {
        println!("No builds found for {}.", slug);
        return Ok(());
    }

    println!("Builds for {}", slug);
    println!();
    println!(
        "  {}  {:<10}  {:<8}  {:<15}  {:<7}  {:<30}  {:>8}",
        "S", "ID", "NUMBER", "BRANCH", "COMMIT", "MESSAGE", "DURATION"
    );
    println!("  {}", "-".repeat(100));

    for build in list.builds.iter().take(limit) {
        let commit = list.commit_for(build);
        let branch = commit.map(|c| c.branch.as_str()).unwrap_or("-");
        let sha = commit.map(|c| c.short_sha()).unwrap_or_default();
        let message = commit
            .and_then(|c| c.message.lines().next())
            .unwrap_or("");

        println!(
            "  {}  {:<10}  #{:<7}  {:<15}  {:<7}  {:<30}  {:>8}",
            status_icon(build.state),
            build.id,
            build.number,
            truncate(branch, 15),
            sha,
            truncate(message, 30),
            build.duration_text()
        );
    }

    if let Some(latest) = list.builds.first() {
        let finished = latest.finished_text();
        if !finished.is_empty() {
            println!();
            println!("  Latest build {}", finished);
        }
    }

    Ok(())
}
