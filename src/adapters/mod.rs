//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum routes, middleware and error mapping
//! - `postgres` - sqlx repositories
//! - `memory` - in-process stores for tests and local development
//! - `helio` - Helio REST client
//! - `rate_limiter` - request throttling (in-memory, Redis)

pub mod helio;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod rate_limiter;
