//! Tracked repository CLI command handlers

use std::path::PathBuf;

use crate::api::gateway::RemoteGateway;
use crate::api::models::{BuildState, TrackedRepo};
use crate::cli::commands::ReposCommand;
use crate::cli::context::AppContext;
use crate::core::repo_store::RepoStore;
use crate::core::storage::Storage;
use crate::core::sync;
use crate::error::{BuildTrackerError, Result};

/// Handle tracked repository commands
pub async fn handle_repos(command: ReposCommand, data_dir: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(data_dir)?;
    match command {
        ReposCommand::List => handle_list(&ctx),
        ReposCommand::Add { slug } => handle_add(&ctx, &slug).await,
        ReposCommand::Remove { slug } => handle_remove(&ctx, &slug),
        ReposCommand::Move { from, to } => handle_move(&ctx, from, to),
        ReposCommand::Refresh => handle_refresh(&ctx).await,
        ReposCommand::Clear => handle_clear(&ctx),
        ReposCommand::Search { query } => handle_search(&ctx, &query).await,
    }
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let repos = ctx.repos()?;

    if repos.is_empty() {
        println!("No tracked repositories.");
        println!();
        println!("  Add one with: bt repos add <owner/name>");
        return Ok(());
    }

    print_table(repos.repos());
    Ok(())
}

/// Print tracked repositories with 1-based positions
fn print_table(repos: &[TrackedRepo]) {
    println!(
        "  {:>3}  {}  {:<40}  {:<8}  {:<10}  {:>8}",
        "#", "S", "REPOSITORY", "BUILD", "STATE", "DURATION"
    );
    println!("  {}", "-".repeat(80));

    for (index, repo) in repos.iter().enumerate() {
        let build = &repo.build;
        let number = build
            .last_build_number
            .as_deref()
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:>3}  {}  {:<40}  {:<8}  {:<10}  {:>8}",
            index + 1,
            status_icon(build.state()),
            truncate(&repo.slug, 40),
            number,
            build.state(),
            build.duration_text()
        );
    }
}

async fn handle_add(ctx: &AppContext, slug: &str) -> Result<()> {
    validate_slug(slug)?;

    let mut repos = ctx.repos()?;
    if repos.contains_slug(slug) {
        println!("Already tracking {}.", slug);
        return Ok(());
    }

    let credentials = ctx.credentials()?;
    let gateway = ctx.gateway(&credentials)?;

    let found = gateway.search_repos(slug).await?;
    let repo = found
        .into_iter()
        .find(|r| r.slug.eq_ignore_ascii_case(slug))
        .ok_or_else(|| {
            BuildTrackerError::NotFound(format!(
                "No active Travis repository named '{}'.\n\n  → Check 'bt repos search <query>' for the exact slug.",
                slug
            ))
        })?;

    println!("{}", track(&mut repos, repo)?);
    Ok(())
}

/// Add `repo` and describe the outcome
fn track<S: Storage>(repos: &mut RepoStore<S>, repo: TrackedRepo) -> Result<String> {
    let slug = repo.slug.clone();
    if repos.add(repo)? {
        Ok(format!("✓ Now tracking {} (position {})", slug, repos.len()))
    } else {
        Ok(format!("Already tracking {}.", slug))
    }
}

fn handle_remove(ctx: &AppContext, slug: &str) -> Result<()> {
    let mut repos = ctx.repos()?;
    if repos.remove_slug(slug)? {
        println!("✓ Stopped tracking {}", slug);
    } else {
        println!("{} is not tracked.", slug);
    }
    Ok(())
}

fn handle_move(ctx: &AppContext, from: usize, to: usize) -> Result<()> {
    if from == 0 || to == 0 {
        return Err(BuildTrackerError::InvalidInput(
            "Positions start at 1, as shown by 'bt repos list'".to_string(),
        ));
    }

    let mut repos = ctx.repos()?;
    repos.move_entry(from - 1, to - 1)?;
    println!("✓ Swapped positions {} and {}", from, to);
    println!();
    print_table(repos.repos());
    Ok(())
}

async fn handle_refresh(ctx: &AppContext) -> Result<()> {
    let mut repos = ctx.repos()?;
    if repos.is_empty() {
        println!("No tracked repositories.");
        return Ok(());
    }

    let credentials = ctx.credentials()?;
    let gateway = ctx.gateway(&credentials)?;

    let updated = sync::refresh_tracked(&gateway, &mut repos).await?;
    println!("✓ Updated {} of {} repositories", updated, repos.len());
    println!();
    print_table(repos.repos());
    Ok(())
}

fn handle_clear(ctx: &AppContext) -> Result<()> {
    let mut repos = ctx.repos()?;
    let count = repos.len();
    repos.remove_all()?;
    println!("✓ Stopped tracking {} repositories", count);
    Ok(())
}

async fn handle_search(ctx: &AppContext, query: &str) -> Result<()> {
    let credentials = ctx.credentials()?;
    let gateway = ctx.gateway(&credentials)?;
    let tracked = ctx.repos()?;

    let found = gateway.search_repos(query).await?;
    if found.is_empty() {
        println!("No active repositories match '{}'.", query);
        return Ok(());
    }

    println!("  {:<2} {:<40}  {}", "", "REPOSITORY", "DESCRIPTION");
    println!("  {}", "-".repeat(80));
    for repo in &found {
        let marker = if tracked.contains(repo) { "★" } else { " " };
        println!(
            "  {:<2} {:<40}  {}",
            marker,
            truncate(&repo.slug, 40),
            truncate(repo.description.as_deref().unwrap_or(""), 36)
        );
    }
    println!();
    println!("  ★ = tracked");
    Ok(())
}

fn validate_slug(slug: &str) -> Result<()> {
    let mut parts = slug.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(BuildTrackerError::InvalidInput(format!(
            "'{}' is not a repository slug (expected owner/name)",
            slug
        ))),
    }
}

pub(crate) fn status_icon(state: BuildState) -> &'static str {
    match state {
        BuildState::Queued | BuildState::Started => "⏳",
        BuildState::Passed => "✓",
        BuildState::Failed | BuildState::Errored => "✗",
        BuildState::Canceled => "○",
        BuildState::Unknown => "?",
    }
}

/// Truncate to `max` characters, marking the cut with "..."
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("octocat/hello").is_ok());
        assert!(validate_slug("octocat").is_err());
        assert!(validate_slug("/hello").is_err());
        assert!(validate_slug("a/b/c").is_err());
    }

    #[test]
    fn test_track_reports_existing_entry() {
        let mut repos = RepoStore::new(MemoryStorage::new());

        let added = track(&mut repos, TrackedRepo::new(1, "Octocat/Hello")).unwrap();
        assert!(added.starts_with("✓ Now tracking Octocat/Hello"));

        // The server returns the canonical slug, even when the user typed another case
        let again = track(&mut repos, TrackedRepo::new(1, "Octocat/Hello")).unwrap();
        assert_eq!(again, "Already tracking Octocat/Hello.");
        assert_eq!(repos.len(), 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 10), "a-very-...");
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(BuildState::Passed), "✓");
        assert_eq!(status_icon(BuildState::Started), "⏳");
        assert_eq!(status_icon(BuildState::Errored), "✗");
    }
}
