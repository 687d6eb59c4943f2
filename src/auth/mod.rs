//! Authentication module
//!
//! Request handlers, domain service and the dual-secret token issuer for
//! registration, login, refresh rotation and logout.

pub mod handlers;
pub mod service;
pub mod tokens;

pub use service::AuthService;
pub use tokens::{Claims, TokenIssuer};
