//! Reconciliation module - one [`ReconciliationContext`] per dashboard instance.

mod reconcile_context;
mod reconcile_model;


pub use reconcile_context::ReconciliationContext;
pub use reconcile_model::FetchTicket;
