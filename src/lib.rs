//! build-tracker - Travis CI build status for the repositories you care about
//!
//! This library provides the login handshake (GitHub OAuth code → GitHub
//! token → Travis token), durable credential storage, and an ordered list of
//! tracked repositories refreshed with live build status. The `bt` binary is
//! a thin CLI on top of it.

pub mod api;
pub mod cli;
pub mod core;
pub mod error;

pub use error::{BuildTrackerError, Result};
