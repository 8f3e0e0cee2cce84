//! Helio payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Helio REST API:
//! pay-link creation for renewal checkouts and transaction status lookups
//! for webhooks that arrive as pending.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HelioConfig::new(api_key).with_base_url("https://api.hel.io");
//! let client = HelioClient::new(config)?;
//! ```

mod client;
mod types;

pub use client::{HelioClient, HelioConfig};
