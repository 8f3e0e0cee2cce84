//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, time values, the state machine trait and error types
//! that form the vocabulary of the marketplace billing domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CreatorId, ModelId, PaymentId, PlanId, SubscriptionId, UsageRecordId, UserId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
