//! HTTP adapters - REST API implementations.

pub mod error;
pub mod extract;
pub mod marketplace;
pub mod middleware;
mod router;

pub use marketplace::{AppState, ReconcilerSettings};
pub use router::{build_router, HttpSettings};
