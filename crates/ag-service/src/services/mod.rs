//! Service layer for the Access Gateway.
//!
//! # Components
//!
//! - `media_backend` - client interface to the media backend (HTTP + mock)
//! - `session_registry` - in-memory session/token registry
//! - `access_gateway` - identity/role resolution and delegation

pub mod access_gateway;
pub mod media_backend;
pub mod session_registry;

pub use access_gateway::AccessGateway;
pub use media_backend::{BackendError, BackendHandle, HttpMediaBackend, MediaBackend};
pub use session_registry::SessionRegistry;
// Mock backend for testing (exposed for integration tests)
#[allow(unused_imports)]
pub use media_backend::mock::MockMediaBackend;
