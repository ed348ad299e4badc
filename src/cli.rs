//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for fintrack using clap's derive macros.

use clap::{Parser, Subcommand};

/// Fintrack - personal finance tracker backend
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(version)]
#[command(about = "Personal finance tracker backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
///
/// Without a subcommand the HTTP server is started.
#[derive(Subcommand)]
pub enum Commands {
    /// Create a user account
    CreateUser {
        /// Login email
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// ISO 4217 currency code (default: USD)
        #[arg(long)]
        currency: Option<String>,

        /// Password (not recommended, visible in shell history)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Reset a user's password
    ResetPassword {
        /// Login email of the account
        #[arg(long)]
        email: String,

        /// New password (if not provided, will prompt interactively)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_server() {
        let cli = Cli::try_parse_from(["fintrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "reset-password",
            "--email",
            "a@b.co",
            "-c",
            "/etc/fintrack.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/fintrack.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::ResetPassword { stdin: false, .. })
        ));
    }

    #[test]
    fn test_password_and_stdin_conflict() {
        let result = Cli::try_parse_from([
            "fintrack",
            "create-user",
            "--email",
            "a@b.co",
            "--name",
            "A",
            "--password",
            "secret123",
            "--stdin",
        ]);
        assert!(result.is_err());
    }
}
