//! System-level modules
//!
//! Process-wide concerns that sit below the application layers.

pub mod logging;
