//! Pending module - updates waiting for a rendering region, with bounded retry.

mod pending_model;
mod pending_queue;

#[cfg(test)]
mod pending_queue_tests;

pub use pending_model::{DeliveryOutcome, PendingState, PendingUpdate, RetryResolution};
pub use pending_queue::{attempt_delivery, PendingQueue};
