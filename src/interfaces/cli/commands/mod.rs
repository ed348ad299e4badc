//! CLI command implementations
//!
//! This module re-exports all CLI command functions.

mod config_gen;
mod users;

pub use config_gen::config_generate;
pub use users::{create_user, reset_password};
