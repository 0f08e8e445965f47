//! Opens stores and the API client for a single CLI invocation

use std::path::PathBuf;

use crate::api::client::TravisGateway;
use crate::core::config::{Config, CredentialBackend};
use crate::core::credentials::CredentialStore;
use crate::core::repo_store::RepoStore;
use crate::core::storage::{FileStorage, KeyringStorage, Storage};
use crate::error::Result;

/// Subdirectory of the data dir used by the file credential backend
const CREDENTIALS_DIR: &str = "credentials";

pub type Credentials = CredentialStore<Box<dyn Storage>>;
pub type Repos = RepoStore<FileStorage>;

/// Loaded configuration plus the resolved data directory
pub struct AppContext {
    pub config: Config,
    data_dir: PathBuf,
}

impl AppContext {
    /// Load config and resolve where local data lives
    pub fn load(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let config = Config::load()?;
        let data_dir = config.data_dir(data_dir_override)?;
        tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");
        Ok(Self { config, data_dir })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Open the credential store on the configured backend
    pub fn credentials(&self) -> Result<Credentials> {
        let storage: Box<dyn Storage> = match self.config.credential_backend {
            CredentialBackend::Keyring => Box::new(KeyringStorage::new()),
            CredentialBackend::File => {
                Box::new(FileStorage::with_path(self.data_dir.join(CREDENTIALS_DIR))?)
            }
        };
        Ok(CredentialStore::open(storage))
    }

    /// Open the tracked repository list
    pub fn repos(&self) -> Result<Repos> {
        Ok(RepoStore::open(FileStorage::with_path(&self.data_dir)?))
    }

    /// API client without a Travis token, for the login exchange
    pub fn anonymous_gateway(&self) -> Result<TravisGateway> {
        TravisGateway::new(&self.config)
    }

    /// API client authorized with the stored Travis token
    pub fn gateway(&self, credentials: &Credentials) -> Result<TravisGateway> {
        let token = credentials.require_ci_token()?;
        Ok(TravisGateway::new(&self.config)?.with_ci_token(Some(token)))
    }
}
