//! Portfolio Panel Core - update reconciliation for the portfolio dashboard panel.
//!
//! Folds asynchronous, possibly chunked and out-of-order snapshot updates for
//! accounts, portfolios and positions into a consistent in-memory view
//! without losing previously known fields. Rendering, transport and FX are
//! external collaborators reached through traits.

pub mod accounts;
pub mod aggregate;
pub mod chunks;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod errors;
pub mod events;
pub mod messages;
pub mod normalize;
pub mod patch;
pub mod pending;
pub mod portfolios;
pub mod positions;
pub mod reconcile;
pub mod runtime;
pub mod scheduler;
pub mod surface;
pub mod utils;

pub use config::ReconcileConfig;
pub use reconcile::{FetchTicket, ReconciliationContext};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
