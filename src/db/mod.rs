//! Database module
//!
//! User records and the data access layer over Postgres, including the
//! atomic refresh-token-set updates the rotation protocol relies on.

pub mod models;
pub mod operations;

pub use models::{AccountType, User};
pub use operations::DbOperations;
