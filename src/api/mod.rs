//! HTTP API: JSON endpoints under `/api/v1`, health probes and middleware

pub mod jwt;
pub mod middleware;
pub mod services;
