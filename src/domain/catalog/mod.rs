//! Read-only view of the service catalog.

mod service;

pub use service::{BillingKind, Service};
