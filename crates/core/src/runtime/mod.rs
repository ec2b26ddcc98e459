//! Tokio runtime adapter.
//!
//! Wires a [`ReconciliationContext`](crate::reconcile::ReconciliationContext)
//! to real timers and background fetches.

mod fetcher;
mod reconcile_runtime;
mod tokio_scheduler;
mod trigger;


pub use fetcher::{wait_for_surface, PositionsFetcher};
pub use reconcile_runtime::ReconcileRuntime;
pub use tokio_scheduler::TokioRetryScheduler;
pub use trigger::Trigger;
