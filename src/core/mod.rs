//! Core functionality for build-tracker
//!
//! This module contains the state the app keeps between runs:
//! - Credential storage (GitHub and Travis tokens, account profile)
//! - The login handshake state machine
//! - The ordered list of tracked repositories
//! - Refresh flows combining the gateway with the stores
//! - Application configuration and storage backends

pub mod config;
pub mod credentials;
pub mod handshake;
pub mod repo_store;
pub mod storage;
pub mod sync;

pub use config::{Config, CredentialBackend};
pub use credentials::{mask_token, CredentialStore};
pub use handshake::{AuthHandshake, HandshakeEvent, HandshakeState};
pub use repo_store::RepoStore;
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage};
