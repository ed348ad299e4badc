//! Startup wiring and graceful shutdown

pub mod shutdown;
pub mod startup;
