//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod billing;
mod entitlement;
mod identity;
mod quota;

pub use billing::{BillingEvent, BillingEventKind, EntitlementTransition, SubscriptionStatus};
pub use entitlement::{ProfileEntitlement, parse_profile_timestamp};
pub use identity::{ClientAddress, Identity, UserId};
pub use quota::{Admission, AdmissionReason, COUNTER_RETENTION_SECONDS, CounterKey, Remaining};
