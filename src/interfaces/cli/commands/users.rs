//! 用户管理 CLI 命令：创建用户、重置密码

use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::interfaces::cli::CliError;
use crate::services::{RegisterRequest, UserService};

/// 从不同来源获取密码
fn get_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::CommandError(format!("Failed to read from stdin: {}", e)))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else if let Some(pwd) = password {
        Ok(pwd)
    } else {
        prompt_password_with_confirm()
    }
}

/// 交互式输入密码（带确认）
fn prompt_password_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::CommandError(
            "No password provided. Use --password or --stdin flag, or run interactively."
                .to_string(),
        ));
    }

    let read = |prompt: &str| -> Result<String, CliError> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::CommandError(format!("Failed to read password: {}", e)))
    };

    let password = read("Enter password: ")?;
    let confirm = read("Confirm password: ")?;

    if password != confirm {
        return Err(CliError::CommandError("Passwords do not match".to_string()));
    }

    Ok(password)
}

/// 运行 create-user 命令
pub async fn create_user(
    users: &UserService,
    email: String,
    name: String,
    currency: Option<String>,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let password = get_password(password, stdin)?;

    let user = users
        .register(RegisterRequest {
            email,
            password,
            name,
            currency,
        })
        .await?;

    println!(
        "{} Created user {} ({}) with id {}",
        "✓".green().bold(),
        user.name.cyan(),
        user.email.blue(),
        user.id
    );
    Ok(())
}

/// 运行 reset-password 命令
pub async fn reset_password(
    users: &UserService,
    email: String,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let new_password = get_password(password, stdin)?;
    let user = users.reset_password(&email, &new_password).await?;

    println!(
        "{} Password reset for {}",
        "✓".green().bold(),
        user.email.blue()
    );
    Ok(())
}
