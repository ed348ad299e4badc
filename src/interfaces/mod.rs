//! User-facing interfaces other than the HTTP API

pub mod cli;
