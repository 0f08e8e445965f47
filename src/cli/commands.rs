//! CLI command definitions using clap
//!
//! Defines the command structure for the `bt` CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// build-tracker - Travis CI build status for your repositories
///
/// Log in once, pick the repositories you care about, and check their
/// latest builds from the terminal.
#[derive(Parser, Debug)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Directory for tracked repositories and file-backed credentials
    #[arg(long, global = true, env = "BT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with GitHub and Travis CI
    Auth(AuthArgs),

    /// Manage tracked repositories
    Repos(ReposArgs),

    /// View and control builds
    Builds(BuildsArgs),

    /// Travis accounts visible to you
    Accounts(AccountsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Login with GitHub, then exchange for a Travis token
    Login {
        /// Anti-forgery state to send (random if omitted)
        #[arg(long)]
        state: Option<String>,
    },
    /// Logout, remove stored credentials and tracked repositories
    Logout,
    /// Show current authentication status
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Repo Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Tracked repository commands
#[derive(Parser, Debug)]
pub struct ReposArgs {
    #[command(subcommand)]
    pub command: ReposCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReposCommand {
    /// Show tracked repositories with their last known build
    List,

    /// Track a repository
    Add {
        /// Repository slug (owner/name)
        slug: String,
    },

    /// Stop tracking a repository
    Remove {
        /// Repository slug (owner/name)
        slug: String,
    },

    /// Swap two entries (positions as shown by 'bt repos list')
    Move {
        from: usize,
        to: usize,
    },

    /// Fetch the latest build status for every tracked repository
    Refresh,

    /// Stop tracking everything
    Clear,

    /// Search active Travis repositories
    Search {
        query: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Build Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Build commands
#[derive(Parser, Debug)]
pub struct BuildsArgs {
    #[command(subcommand)]
    pub command: BuildsCommand,
}

#[derive(Subcommand, Debug)]
pub enum BuildsCommand {
    /// List recent builds of a repository
    List {
        /// Repository slug (owner/name)
        slug: String,

        /// Maximum number of builds to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Restart a build
    Restart {
        build_id: u64,
    },

    /// Cancel a running build
    Cancel {
        build_id: u64,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Account Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Account commands
#[derive(Parser, Debug)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub command: AccountsCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    /// List accounts and refresh your profile
    List,

    /// Active repositories of an account
    Repos {
        /// Account login
        owner: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Reset a configuration value to its default
    Remove {
        /// Configuration key
        key: ConfigKey,
    },

    /// Print the configuration file location
    Path,
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigKey {
    /// Travis API root URL
    #[value(name = "api-base-url")]
    ApiBaseUrl,

    /// GitHub OAuth app client id
    #[value(name = "github-client-id")]
    GithubClientId,

    /// GitHub OAuth app client secret
    #[value(name = "github-client-secret")]
    GithubClientSecret,

    /// Scopes requested at login
    #[value(name = "oauth-scopes")]
    OauthScopes,

    /// keyring or file
    #[value(name = "credential-backend")]
    CredentialBackend,

    /// Data directory override
    #[value(name = "data-dir")]
    DataDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move() {
        let cli = Cli::try_parse_from(["bt", "repos", "move", "1", "3"]).unwrap();
        match cli.command {
            Commands::Repos(ReposArgs {
                command: ReposCommand::Move { from, to },
            }) => assert_eq!((from, to), (1, 3)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_data_dir() {
        let cli = Cli::try_parse_from(["bt", "repos", "list", "--data-dir", "/tmp/bt"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/bt")));
    }
}
