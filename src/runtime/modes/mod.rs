//! Mode routing
//!
//! This module provides unified entry points for the execution modes:
//! - Server mode (HTTP server, no subcommand)
//! - CLI mode (administrative subcommands)

pub mod cli;
pub mod server;

// Re-export mode functions for convenience
pub use cli::run_cli;
pub use server::{configure_app, run_server};
