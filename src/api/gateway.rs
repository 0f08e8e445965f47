//! Remote gateway abstraction
//!
//! The core (handshake, stores, refresh) only talks to the network through
//! this trait. [`crate::api::TravisGateway`] is the HTTP implementation.

use async_trait::async_trait;

use crate::api::auth::{CiToken, SourceHostToken};
use crate::api::models::{AccountProfile, BuildList, TrackedRepo};
use crate::error::Result;

/// Authenticated calls against GitHub (exchange only) and Travis
///
/// Everything except the two exchange calls needs a CI token and fails with
/// `Unauthenticated` without one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Trade a one-time authorization code for a GitHub token
    async fn exchange_authorization_code(&self, code: &str, state: &str)
        -> Result<SourceHostToken>;

    /// Trade a GitHub token for a Travis token
    async fn exchange_for_service_token(&self, token: &SourceHostToken) -> Result<CiToken>;

    /// Accounts (user and organizations) visible to the token
    async fn fetch_accounts(&self) -> Result<Vec<AccountProfile>>;

    /// Current records for the given repository ids
    async fn fetch_repos(&self, ids: &[String]) -> Result<Vec<TrackedRepo>>;

    /// Recent builds of a repository
    async fn fetch_build_status(&self, slug: &str) -> Result<BuildList>;

    /// Active repositories matching a free-text query
    async fn search_repos(&self, query: &str) -> Result<Vec<TrackedRepo>>;

    /// Active repositories of `owner` that `member` belongs to
    async fn fetch_owner_repos(&self, owner: &str, member: &str) -> Result<Vec<TrackedRepo>>;

    async fn restart_build(&self, build_id: u64) -> Result<()>;

    async fn cancel_build(&self, build_id: u64) -> Result<()>;
}
