//! Where reconciliation events go.

use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::mpsc;

use super::ReconcileEvent;

/// Receives events from the reconciliation context.
///
/// Called on the worker that owns the context, once per handled message,
/// so implementations must not block or re-enter the context. Delivery is
/// best-effort: a listener that went away loses events without affecting
/// reconciliation.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: ReconcileEvent);

    /// Emits the events of one handled message, in order.
    fn emit_batch(&self, events: Vec<ReconcileEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Forwards events onto an unbounded tokio channel.
///
/// Listeners (price-history caches, the accounts table) consume the
/// receiving end at their own pace.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<ReconcileEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<ReconcileEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReconcileEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl DomainEventSink for ChannelEventSink {
    fn emit(&self, event: ReconcileEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event listener closed, dropping reconciliation event");
        }
    }
}

/// Keeps every emitted event in memory for later inspection.
#[derive(Clone, Default)]
pub struct RecordingEventSink {
    recorded: Arc<Mutex<Vec<ReconcileEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_recorded<R>(&self, read: impl FnOnce(&mut Vec<ReconcileEvent>) -> R) -> R {
        let mut recorded = self.recorded.lock().unwrap_or_else(|e| e.into_inner());
        read(&mut recorded)
    }

    /// Everything emitted so far, oldest first.
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.with_recorded(|recorded| recorded.clone())
    }

    /// Only the provenance-change events.
    pub fn diagnostics(&self) -> Vec<ReconcileEvent> {
        self.with_recorded(|recorded| {
            recorded
                .iter()
                .filter(|event| matches!(event, ReconcileEvent::Diagnostics { .. }))
                .cloned()
                .collect()
        })
    }

    /// Removes and returns everything emitted so far.
    pub fn drain(&self) -> Vec<ReconcileEvent> {
        self.with_recorded(std::mem::take)
    }

    pub fn len(&self) -> usize {
        self.with_recorded(|recorded| recorded.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with_recorded(|recorded| recorded.is_empty())
    }
}

impl DomainEventSink for RecordingEventSink {
    fn emit(&self, event: ReconcileEvent) {
        self.with_recorded(|recorded| recorded.push(event));
    }
}
