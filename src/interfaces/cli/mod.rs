//! CLI interface module
//!
//! Administrative commands that work directly against the database.

pub mod commands;

use crate::cli::{Commands, ConfigCommands};
use crate::runtime::lifetime::startup::StartupContext;
use crate::storage::StorageFactory;
use commands::{config_generate, create_user, reset_password};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::FintrackError> for CliError {
    fn from(err: crate::errors::FintrackError) -> Self {
        match err {
            crate::errors::FintrackError::Validation(msg) => CliError::ParseError(msg),
            crate::errors::FintrackError::DatabaseConfig(_)
            | crate::errors::FintrackError::DatabaseConnection(_)
            | crate::errors::FintrackError::DatabaseOperation(_) => {
                CliError::StorageError(err.to_string())
            }
            other => CliError::CommandError(other.to_string()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need DB connection, handle it separately
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    let ctx = StartupContext::build(storage.clone());

    let result = match cmd {
        Commands::CreateUser {
            email,
            name,
            currency,
            password,
            stdin,
        } => create_user(&ctx.users, email, name, currency, password, stdin).await,

        Commands::ResetPassword {
            email,
            password,
            stdin,
        } => reset_password(&ctx.users, email, password, stdin).await,

        Commands::Config { .. } => unreachable!("handled above"),
    };

    if let Err(e) = storage.close().await {
        tracing::debug!("Failed to close storage after CLI command: {}", e);
    }
    result
}
