//! Model Market - billing core for an AI model marketplace.
//!
//! Verifies and reconciles Helio payment webhooks into subscriptions,
//! prices renewals, meters model usage against plan quotas and credits
//! creators their share of metered revenue.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
