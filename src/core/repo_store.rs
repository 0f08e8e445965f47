//! Ordered, persisted list of tracked repositories
//!
//! Membership and order change only through explicit user actions
//! (`add`, `remove`, `move_entry`, `remove_all`). A status refresh goes
//! through [`RepoStore::merge`], which rewrites build snapshots in place and
//! never adds, drops or reorders entries.

use std::collections::HashMap;

use crate::api::models::{BuildSnapshot, TrackedRepo};
use crate::core::storage::Storage;
use crate::error::{BuildTrackerError, Result};

pub const TRACKED_REPO_LIST_KEY: &str = "tracked-repo-list";

/// Tracked repositories in user-defined order
pub struct RepoStore<S: Storage> {
    storage: S,
    repos: Vec<TrackedRepo>,
}

impl<S: Storage> RepoStore<S> {
    /// Create an empty store on top of `storage`; call [`load`](Self::load) to restore
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            repos: Vec::new(),
        }
    }

    /// Create a store and restore the persisted list
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Restore the list; absent or corrupt data yields an empty list
    pub fn load(&mut self) {
        self.repos = match self.storage.read(TRACKED_REPO_LIST_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "tracked repositories undecodable, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "tracked repositories unreadable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(count = self.repos.len(), "tracked repositories loaded");
    }

    /// Write `repos` and adopt it; on a failed write the current list stays
    fn commit(&mut self, repos: Vec<TrackedRepo>) -> Result<()> {
        let json = serde_json::to_string(&repos).map_err(|e| {
            BuildTrackerError::Storage(format!("Failed to serialize tracked repositories: {}", e))
        })?;
        self.storage.write(TRACKED_REPO_LIST_KEY, &json)?;
        self.repos = repos;
        Ok(())
    }

    fn position(&self, slug: &str) -> Option<usize> {
        self.repos.iter().position(|r| r.slug == slug)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership and order
    // ─────────────────────────────────────────────────────────────────────────

    /// Append `repo` unless one with the same slug is already tracked
    ///
    /// Returns whether the list changed.
    pub fn add(&mut self, repo: TrackedRepo) -> Result<bool> {
        if self.contains_slug(&repo.slug) {
            return Ok(false);
        }
        tracing::debug!(slug = %repo.slug, "tracking repository");
        let mut repos = self.repos.clone();
        repos.push(repo);
        self.commit(repos)?;
        Ok(true)
    }

    /// Stop tracking the entry with the same slug as `repo`
    pub fn remove(&mut self, repo: &TrackedRepo) -> Result<bool> {
        self.remove_slug(&repo.slug)
    }

    /// Stop tracking `slug`; untracked slugs are a no-op
    pub fn remove_slug(&mut self, slug: &str) -> Result<bool> {
        let Some(index) = self.position(slug) else {
            return Ok(false);
        };
        tracing::debug!(slug, "untracking repository");
        let mut repos = self.repos.clone();
        repos.remove(index);
        self.commit(repos)?;
        Ok(true)
    }

    pub fn contains(&self, repo: &TrackedRepo) -> bool {
        self.contains_slug(&repo.slug)
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.position(slug).is_some()
    }

    /// Swap the entries at `from` and `to`
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.repos.len();
        if from >= len || to >= len {
            return Err(BuildTrackerError::InvalidInput(format!(
                "Cannot move entry {} to {}: only {} repositories are tracked",
                from, to, len
            )));
        }
        if from == to {
            return Ok(());
        }
        let mut repos = self.repos.clone();
        repos.swap(from, to);
        self.commit(repos)
    }

    /// Stop tracking everything
    pub fn remove_all(&mut self) -> Result<()> {
        self.commit(Vec::new())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply fresh build status to matching entries (by id)
    ///
    /// Only the build snapshot of an existing entry is replaced. Fresh records
    /// with no tracked counterpart are ignored. Returns how many entries were
    /// updated.
    pub fn merge(&mut self, fresh: &[TrackedRepo]) -> Result<usize> {
        let by_id: HashMap<u64, &BuildSnapshot> =
            fresh.iter().map(|repo| (repo.id, &repo.build)).collect();

        let mut updated = 0;
        let merged: Vec<TrackedRepo> = self
            .repos
            .iter()
            .map(|repo| match by_id.get(&repo.id) {
                Some(build) => {
                    updated += 1;
                    TrackedRepo {
                        build: (*build).clone(),
                        ..repo.clone()
                    }
                }
                None => repo.clone(),
            })
            .collect();

        self.commit(merged)?;
        tracing::debug!(updated, fresh = fresh.len(), "merged build status");
        Ok(updated)
    }

    /// Tracked ids in list order, as the API expects them
    pub fn ids(&self) -> Vec<String> {
        self.repos.iter().map(|r| r.id.to_string()).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn repos(&self) -> &[TrackedRepo] {
        &self.repos
    }

    pub fn get(&self, index: usize) -> Option<&TrackedRepo> {
        self.repos.get(index)
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}
