//! Service layer for business logic
//!
//! Services validate input, apply the finance rules and talk to storage.
//! They are shared between the HTTP API and the CLI.

mod budget_service;
mod category_service;
mod goal_service;
pub mod import;
pub mod notification;
mod transaction_service;
mod user_service;

pub use budget_service::*;
pub use category_service::*;
pub use goal_service::*;
pub use import::{ImportOptions, ImportReport, ImportService, RowError};
pub use notification::{NotificationEvent, NotificationService};
pub use transaction_service::*;
pub use user_service::*;
