//! Access Gateway (AG) Service Library
//!
//! This library brokers access to a remote media conferencing backend:
//! it authenticates a fixed set of users, issues one-time connection
//! tokens scoped to named video-call sessions, and retires sessions and
//! tokens as participants leave.
//!
//! # Modules
//!
//! - `auth` - Login sessions and the identity gate
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Request middleware
//! - `models` - Data models
//! - `observability` - Metrics
//! - `repositories` - User directory
//! - `routes` - Router and application state
//! - `services` - Media backend client, session registry, gateway orchestration

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
