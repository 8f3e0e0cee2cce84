//! Billing module - Helio payment webhooks and the payment ledger.
//!
//! Webhook deliveries flow through signature verification, event parsing
//! and idempotent payment recording before any subscription transition is
//! attempted.

mod helio_event;
mod payment;
mod payment_processor;
mod webhook_errors;
mod webhook_verifier;

pub use helio_event::{HelioEvent, HelioEventKind, PaymentMetadata, TransactionStatus};
pub use payment::Payment;
pub use payment_processor::{PaymentProcessor, RecordedPayment};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::HelioWebhookVerifier;
