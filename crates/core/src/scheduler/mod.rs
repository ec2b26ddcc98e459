//! Retry scheduling.
//!
//! The core never owns real timers: it arms them through [`RetryScheduler`]
//! and is called back when they fire. The tokio-backed implementation lives
//! in the runtime module; [`ManualScheduler`] drives tests.

mod manual_scheduler;
mod scheduler_traits;

pub use manual_scheduler::{ManualScheduler, ScheduledTimer};
pub use scheduler_traits::{RetryScheduler, TimerId};
