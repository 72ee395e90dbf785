//! Application services and ports.

#![forbid(unsafe_code)]

mod clock;
mod counter_store;
mod entitlement_resolver;
mod gatekeeper;
mod profile_ports;
mod watermark_ports;
mod webhook_processor;

pub use clock::{Clock, SystemClock};
pub use counter_store::{CounterBackend, CounterStore};
pub use entitlement_resolver::EntitlementResolver;
pub use gatekeeper::Gatekeeper;
pub use profile_ports::{ProfileRepository, ProfileUpdate};
pub use watermark_ports::{ImageFormat, ImageUpload, WatermarkRemover};
pub use webhook_processor::{WebhookOutcome, WebhookProcessor, WebhookSignatureVerifier};
