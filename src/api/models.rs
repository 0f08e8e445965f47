//! Travis CI API v2.1 records
//!
//! These types decode straight from provider responses and are also the
//! persisted shape of tracked repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a build as reported by Travis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    #[serde(alias = "created")]
    Queued,
    Started,
    Passed,
    Failed,
    Errored,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BuildState {
    /// Returns true if the build has not finished yet
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Started)
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Started => write!(f, "started"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Errored => write!(f, "errored"),
            Self::Canceled => write!(f, "canceled"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Kind of Travis account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Organization,
}

/// An account the authenticated user can see on Travis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: u64,
    pub login: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub repos_count: u64,
    #[serde(rename = "type")]
    pub kind: AccountKind,
}

/// Mutable, server-sourced part of a tracked repository
///
/// This is the only part overwritten by a merge-refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildSnapshot {
    #[serde(default)]
    pub last_build_id: Option<u64>,
    #[serde(default)]
    pub last_build_number: Option<String>,
    #[serde(default)]
    pub last_build_state: Option<BuildState>,
    /// Seconds
    #[serde(default)]
    pub last_build_duration: Option<u64>,
    #[serde(default)]
    pub last_build_language: Option<String>,
    #[serde(default)]
    pub last_build_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_build_finished_at: Option<DateTime<Utc>>,
    /// Whether CI is enabled for the repository
    #[serde(default)]
    pub active: Option<bool>,
}

impl BuildSnapshot {
    /// Last build state, `Unknown` when the server reported none
    pub fn state(&self) -> BuildState {
        self.last_build_state.unwrap_or_default()
    }

    /// Human readable duration of the last build
    pub fn duration_text(&self) -> String {
        self.last_build_duration
            .map(format_duration)
            .unwrap_or_default()
    }
}

/// A repository the user has opted to track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRepo {
    /// Stable remote identifier
    pub id: u64,
    /// `owner/name`
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_language: Option<String>,
    #[serde(flatten)]
    pub build: BuildSnapshot,
}

impl TrackedRepo {
    pub fn new(id: u64, slug: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            description: None,
            github_language: None,
            build: BuildSnapshot::default(),
        }
    }

    /// Set the build snapshot
    pub fn with_build(mut self, build: BuildSnapshot) -> Self {
        self.build = build;
        self
    }

    /// Owner half of the slug
    pub fn owner(&self) -> &str {
        self.slug.split('/').next().unwrap_or(&self.slug)
    }
}

/// A single build of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    pub number: String,
    pub state: BuildState,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub event_type: String,
    #[serde(default)]
    pub pull_request: bool,
    #[serde(default)]
    pub pull_request_number: Option<u64>,
    #[serde(default)]
    pub pull_request_title: Option<String>,
    pub commit_id: u64,
    pub repository_id: u64,
    #[serde(default)]
    pub job_ids: Vec<u64>,
}

impl Build {
    /// Calculate duration string (e.g., "2m 35s")
    pub fn duration_text(&self) -> String {
        self.duration.map(format_duration).unwrap_or_default()
    }

    /// Relative finish time (e.g., "finished 3h ago")
    pub fn finished_text(&self) -> String {
        self.finished_text_at(Utc::now())
    }

    fn finished_text_at(&self, now: DateTime<Utc>) -> String {
        let Some(finished) = self.finished_at else {
            return String::new();
        };
        let ago = now.signed_duration_since(finished).num_seconds().max(0) as u64;
        format!("finished {} ago", format_duration(ago))
    }
}

/// Commit a build ran against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: u64,
    pub sha: String,
    pub branch: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub message: String,
    /// Spelled this way by the API
    #[serde(default, rename = "commited_at", alias = "committed_at")]
    pub committed_at: Option<DateTime<Utc>>,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    pub compare_url: String,
    #[serde(default)]
    pub pull_request_number: Option<u64>,
}

impl Commit {
    /// First seven characters of the sha
    pub fn short_sha(&self) -> String {
        self.sha.chars().take(7).collect()
    }
}

/// Build history of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildList {
    pub builds: Vec<Build>,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

impl BuildList {
    /// Commit the given build ran against, if included in the response
    pub fn commit_for(&self, build: &Build) -> Option<&Commit> {
        self.commits.iter().find(|c| c.id == build.commit_id)
    }
}

/// `GET /repos` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ReposResponse {
    pub repos: Vec<TrackedRepo>,
}

/// `GET /accounts` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct AccountsResponse {
    pub accounts: Vec<AccountProfile>,
}

/// Format a number of seconds as "42s", "2m 35s" or "1h 3m"
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_repo_record() {
        let json = r#"{
            "id": 42,
            "slug": "octo/widgets",
            "description": null,
            "last_build_id": 900,
            "last_build_number": "17",
            "last_build_state": "passed",
            "last_build_duration": 95,
            "last_build_language": null,
            "last_build_started_at": "2020-03-31T10:00:00Z",
            "last_build_finished_at": "2020-03-31T10:01:35Z",
            "active": true,
            "github_language": "Swift"
        }"#;

        let repo: TrackedRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.id, 42);
        assert_eq!(repo.slug, "octo/widgets");
        assert_eq!(repo.owner(), "octo");
        assert_eq!(repo.github_language.as_deref(), Some("Swift"));
        assert_eq!(repo.build.state(), BuildState::Passed);
        assert_eq!(repo.build.last_build_number.as_deref(), Some("17"));
        assert_eq!(repo.build.active, Some(true));
        assert_eq!(repo.build.duration_text(), "1m 35s");
    }

    #[test]
    fn test_build_state_decoding() {
        let created: BuildState = serde_json::from_str(r#""created""#).unwrap();
        assert_eq!(created, BuildState::Queued);

        let odd: BuildState = serde_json::from_str(r#""received""#).unwrap();
        assert_eq!(odd, BuildState::Unknown);

        let repo: TrackedRepo = serde_json::from_str(r#"{"id":1,"slug":"a/a"}"#).unwrap();
        assert_eq!(repo.build.state(), BuildState::Unknown);
    }

    #[test]
    fn test_decode_account() {
        let json = r#"{"repos_count":12,"name":"Octo Cat","type":"user","id":7,"login":"octocat","avatar_url":null}"#;
        let account: AccountProfile = serde_json::from_str(json).unwrap();
        assert_eq!(account.kind, AccountKind::User);
        assert_eq!(account.login, "octocat");
        assert_eq!(account.avatar_url, None);
    }

    #[test]
    fn test_build_list_commit_lookup() {
        let json = r#"{
            "builds": [{
                "commit_id": 5, "duration": 30, "finished_at": null, "id": 10,
                "job_ids": [11, 12], "number": "3", "event_type": "push",
                "pull_request": false, "pull_request_number": null,
                "pull_request_title": null, "repository_id": 42,
                "started_at": null, "state": "started"
            }],
            "commits": [{
                "id": 5, "sha": "0123456789abcdef", "branch": "main", "tag": null,
                "message": "Fix", "commited_at": "2020-03-31T10:00:00Z",
                "author_name": "A", "author_email": "a@example.com",
                "committer_name": "A", "committer_email": "a@example.com",
                "compare_url": "https://github.com/octo/widgets/compare/x",
                "pull_request_number": null
            }]
        }"#;

        let list: BuildList = serde_json::from_str(json).unwrap();
        let build = &list.builds[0];
        assert!(build.state.is_active());
        assert_eq!(build.duration_text(), "30s");
        assert_eq!(build.finished_text(), "");

        let commit = list.commit_for(build).unwrap();
        assert_eq!(commit.short_sha(), "0123456");
        assert!(commit.committed_at.is_some());
    }

    #[test]
    fn test_finished_text() {
        let now = Utc::now();
        let build = Build {
            id: 1,
            number: "1".into(),
            state: BuildState::Passed,
            duration: Some(4000),
            started_at: None,
            finished_at: Some(now - chrono::Duration::seconds(120)),
            event_type: "push".into(),
            pull_request: false,
            pull_request_number: None,
            pull_request_title: None,
            commit_id: 1,
            repository_id: 1,
            job_ids: vec![],
        };
        assert_eq!(build.finished_text_at(now), "finished 2m 0s ago");
        assert_eq!(build.duration_text(), "1h 6m");
    }
}
