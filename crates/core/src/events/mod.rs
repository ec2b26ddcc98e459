//! Outbound events module.
//!
//! Provides the event types and the sink trait the reconciliation context
//! emits through. Runtime adapters implement the sink to forward events to
//! their own bus.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
