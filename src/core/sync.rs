//! Refresh flows tying the gateway to the stores

use crate::api::gateway::RemoteGateway;
use crate::api::models::{AccountKind, AccountProfile};
use crate::core::credentials::CredentialStore;
use crate::core::repo_store::RepoStore;
use crate::core::storage::Storage;
use crate::error::Result;

/// Fetch the visible accounts and remember the user's own as the profile
///
/// Returns every account so callers can offer organizations too.
pub async fn refresh_account<G, S>(
    gateway: &G,
    credentials: &mut CredentialStore<S>,
) -> Result<Vec<AccountProfile>>
where
    G: RemoteGateway + ?Sized,
    S: Storage,
{
    let accounts = gateway.fetch_accounts().await?;

    if let Some(user) = accounts.iter().find(|a| a.kind == AccountKind::User) {
        credentials.set_account_profile(Some(user.clone()))?;
    }

    Ok(accounts)
}

/// Pull current build status for every tracked repository and merge it
///
/// Returns the number of entries updated. On a failed fetch the list is left
/// exactly as it was.
pub async fn refresh_tracked<G, S>(gateway: &G, repos: &mut RepoStore<S>) -> Result<usize>
where
    G: RemoteGateway + ?Sized,
    S: Storage,
{
    if repos.is_empty() {
        return Ok(0);
    }

    let fresh = match gateway.fetch_repos(&repos.ids()).await {
        Ok(fresh) => fresh,
        Err(e) => {
            tracing::warn!(error = %e, "build status refresh failed");
            return Err(e);
        }
    };

    repos.merge(&fresh)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::gateway::MockRemoteGateway;
    use crate::api::models::{BuildSnapshot, BuildState, TrackedRepo};
    use crate::core::storage::MemoryStorage;
    use crate::error::BuildTrackerError;

    fn account(id: u64, login: &str, kind: AccountKind) -> AccountProfile {
        AccountProfile {
            id,
            login: login.to_string(),
            name: login.to_uppercase(),
            avatar_url: None,
            repos_count: 1,
            kind,
        }
    }

    fn tracked() -> RepoStore<Arc<MemoryStorage>> {
        let mut store = RepoStore::new(Arc::new(MemoryStorage::new()));
        store.add(TrackedRepo::new(1, "a/a")).unwrap();
        store.add(TrackedRepo::new(2, "b/b")).unwrap();
        store
    }

    #[tokio::test]
    async fn test_refresh_account_picks_user() {
        let mut gateway = MockRemoteGateway::new();
        gateway.expect_fetch_accounts().times(1).returning(|| {
            Ok(vec![
                account(1, "acme", AccountKind::Organization),
                account(2, "octocat", AccountKind::User),
            ])
        });

        let mut creds = CredentialStore::new(Arc::new(MemoryStorage::new()));
        let accounts = refresh_account(&gateway, &mut creds).await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(creds.account_profile().unwrap().login, "octocat");
    }

    #[tokio::test]
    async fn test_refresh_tracked_merges_by_id() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_fetch_repos()
            .withf(|ids| ids.to_vec() == vec!["1".to_string(), "2".to_string()])
            .times(1)
            .returning(|_| {
                Ok(vec![TrackedRepo::new(2, "b/b").with_build(BuildSnapshot {
                    last_build_state: Some(BuildState::Passed),
                    ..BuildSnapshot::default()
                })])
            });

        let mut store = tracked();
        let updated = refresh_tracked(&gateway, &mut store).await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(store.ids(), vec!["1", "2"]);
        assert_eq!(store.get(0).unwrap().build.state(), BuildState::Unknown);
        assert_eq!(store.get(1).unwrap().build.state(), BuildState::Passed);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_list() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_fetch_repos()
            .returning(|_| Err(BuildTrackerError::NetworkUnavailable("offline".into())));

        let mut store = tracked();
        let before = store.repos().to_vec();

        assert!(refresh_tracked(&gateway, &mut store).await.is_err());
        assert_eq!(store.repos(), before.as_slice());
    }

    #[tokio::test]
    async fn test_empty_list_skips_network() {
        let gateway = MockRemoteGateway::new();
        let mut store = RepoStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(refresh_tracked(&gateway, &mut store).await.unwrap(), 0);
    }
}
