//! HTTP request handlers for the Access Gateway.

pub mod auth_handler;
pub mod health;
pub mod session_handler;

pub use auth_handler::{handle_login, handle_logout};
pub use health::{health_check, metrics_handler, readiness_check};
pub use session_handler::{handle_token_release, handle_token_request};
