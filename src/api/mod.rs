//! Remote API integration module
//!
//! This module provides all network-facing functionality:
//! - GitHub OAuth web flow and the Travis token exchange
//! - The `RemoteGateway` abstraction and its HTTP implementation
//! - Travis API v2.1 records
//! - Error classification

pub mod auth;
pub mod client;
pub mod error_handler;
pub mod gateway;
pub mod models;

pub use auth::{authorize_url, parse_callback, CiToken, SourceHostToken};
pub use client::TravisGateway;
pub use gateway::RemoteGateway;
pub use models::{AccountKind, AccountProfile, Build, BuildList, BuildSnapshot, BuildState, TrackedRepo};
