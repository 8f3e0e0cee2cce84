//! In-memory adapters.
//!
//! Process-local implementations of the persistence and payment ports for
//! tests and local development. State is lost on restart and not shared
//! between instances.

mod catalog;
mod earnings_ledger;
mod payment_provider;
mod payment_repository;
mod subscription_repository;
mod usage_repository;

pub use catalog::InMemoryCatalog;
pub use earnings_ledger::InMemoryEarningsLedger;
pub use payment_provider::InMemoryPaymentProvider;
pub use payment_repository::InMemoryPaymentRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use usage_repository::InMemoryUsageRepository;
