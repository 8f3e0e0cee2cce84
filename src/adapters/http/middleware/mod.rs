//! HTTP middleware for axum.
//!
//! - `auth` - session extractor for the caller's user id
//! - `rate_limit` - per-client and per-user request throttling

pub mod auth;
pub mod rate_limit;

pub use auth::{AuthenticatedUser, AuthenticationRequired, USER_ID_HEADER};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
