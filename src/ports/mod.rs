//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `PaymentRepository` - Payment ledger keyed by Helio transaction id
//! - `SubscriptionRepository` - Subscription storage with the one-active rule
//! - `UsageRepository` - Append-only usage records and request counts
//! - `EarningsLedger` - Creator earnings increments
//! - `CatalogReader` - Read-only model and plan lookups
//!
//! ## External Service Ports
//!
//! - `PaymentProvider` - Helio pay-link creation and transaction status
//! - `RateLimiter` - Shared client request throttling

mod catalog_reader;
mod earnings_ledger;
mod payment_provider;
mod payment_repository;
mod rate_limiter;
mod subscription_repository;
mod usage_repository;

pub use catalog_reader::CatalogReader;
pub use earnings_ledger::EarningsLedger;
pub use payment_provider::{
    PayLink, PayLinkRequest, PaymentProvider, PaymentProviderError, ProviderTransactionStatus,
};
pub use payment_repository::{PaymentRepository, SaveResult};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use subscription_repository::{CreateOutcome, SubscriptionRepository};
pub use usage_repository::UsageRepository;
