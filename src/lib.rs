//! Fintrack - a personal finance tracker backend
//!
//! This library provides the core functionality for the Fintrack service:
//! transactions, categories, budgets with period alerts, savings goals,
//! spreadsheet import and email / Web Push notifications.
//!
//! # Modes
//! - **server**: HTTP server (no subcommand)
//! - **cli**: Administrative commands (`create-user`, `reset-password`, `config`)
//!
//! # Architecture
//! - `storage`: SeaORM data access (SQLite, MySQL, PostgreSQL)
//! - `services`: Business logic shared by the API and the CLI
//! - `api`: HTTP services and middleware
//! - `interfaces`: User interfaces (CLI)
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
