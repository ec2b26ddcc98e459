use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use log::debug;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;

use super::trigger::Trigger;
use crate::scheduler::{RetryScheduler, TimerId};

/// Retry timers backed by tokio sleeps.
///
/// A fired timer posts [`Trigger::RetryDue`] to the worker channel. The
/// scheduler only holds a weak sender so that it never keeps the worker
/// alive on its own. Must be used from within a tokio runtime.
pub struct TokioRetryScheduler {
    tx: WeakUnboundedSender<Trigger>,
    next_id: AtomicU64,
    timers: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl TokioRetryScheduler {
    pub fn new(tx: WeakUnboundedSender<Trigger>) -> Self {
        Self {
            tx,
            next_id: AtomicU64::new(0),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Timers armed and not yet fired or cancelled.
    pub fn armed_count(&self) -> usize {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.retain(|_, handle| !handle.is_finished());
        timers.len()
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule(&self, portfolio_uuid: &str, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let tx = self.tx.clone();
        let portfolio_uuid = portfolio_uuid.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let delivered = tx.upgrade().is_some_and(|tx| {
                tx.send(Trigger::RetryDue {
                    portfolio_uuid,
                    timer: id,
                })
                .is_ok()
            });
            if !delivered {
                debug!("Worker stopped before {} fired", id);
            }
        });

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.retain(|_, handle| !handle.is_finished());
        timers.insert(id, handle);
        id
    }

    fn cancel(&self, timer: TimerId) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timers.remove(&timer) {
            handle.abort();
        }
    }
}
