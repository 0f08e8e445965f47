//! CLI module for build-tracker
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod accounts;
pub mod auth;
pub mod builds;
pub mod commands;
pub mod config;
pub mod context;
pub mod repos;

pub use commands::{Cli, Commands};
