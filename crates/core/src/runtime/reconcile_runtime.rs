//! Tokio worker owning one reconciliation context.
//!
//! All triggers (push messages, retry timers, user actions, fetch results)
//! funnel through one unbounded channel into a single task, so handlers never
//! interleave. Fetches run in their own tasks and post their result back;
//! the worker itself never awaits inside a handler.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;

use super::fetcher::{wait_for_surface, PositionsFetcher};
use super::tokio_scheduler::TokioRetryScheduler;
use super::trigger::Trigger;
use crate::config::ReconcileConfig;
use crate::errors::{Error, Result};
use crate::events::DomainEventSink;
use crate::reconcile::{FetchTicket, ReconciliationContext};
use crate::surface::RenderingSurface;

/// Dependencies the worker needs beyond the context itself.
struct WorkerDeps {
    tx: WeakUnboundedSender<Trigger>,
    surface: Arc<dyn RenderingSurface>,
    fetcher: Arc<dyn PositionsFetcher>,
    surface_poll_interval: Duration,
    surface_wait_timeout: Duration,
}

/// Handle to a running reconcile worker.
pub struct ReconcileRuntime {
    tx: UnboundedSender<Trigger>,
    worker: JoinHandle<ReconciliationContext>,
}

impl ReconcileRuntime {
    /// Builds a context wired to tokio timers and starts its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        config: ReconcileConfig,
        surface: Arc<dyn RenderingSurface>,
        event_sink: Arc<dyn DomainEventSink>,
        fetcher: Arc<dyn PositionsFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TokioRetryScheduler::new(tx.downgrade()));
        let deps = WorkerDeps {
            tx: tx.downgrade(),
            surface: surface.clone(),
            fetcher,
            surface_poll_interval: config.surface_poll_interval,
            surface_wait_timeout: config.surface_wait_timeout,
        };
        let context = ReconciliationContext::new(config, surface, scheduler, event_sink);
        let worker = tokio::spawn(reconcile_worker(rx, context, deps));
        Ok(Self { tx, worker })
    }

    /// Queues a raw push message.
    pub fn push(&self, raw: Value) -> Result<()> {
        self.send(Trigger::Message(raw))
    }

    pub fn region_expanded(&self, portfolio_uuid: impl Into<String>) -> Result<()> {
        self.send(Trigger::RegionExpanded {
            portfolio_uuid: portfolio_uuid.into(),
        })
    }

    pub fn surface_attached(&self, portfolio_uuid: impl Into<String>) -> Result<()> {
        self.send(Trigger::SurfaceAttached {
            portfolio_uuid: portfolio_uuid.into(),
        })
    }

    /// Stops accepting triggers, lets the worker drain what is queued (including
    /// fetches still in flight) and hands back the final context.
    ///
    /// Retry timers that have not fired yet are abandoned.
    pub async fn shutdown(self) -> Result<ReconciliationContext> {
        drop(self.tx);
        self.worker
            .await
            .map_err(|e| Error::Unexpected(format!("Reconcile worker failed: {}", e)))
    }

    fn send(&self, trigger: Trigger) -> Result<()> {
        self.tx
            .send(trigger)
            .map_err(|_| Error::Unexpected("Reconcile worker has stopped".to_string()))
    }
}

/// Runs until every strong sender is gone, then returns the context.
async fn reconcile_worker(
    mut rx: UnboundedReceiver<Trigger>,
    mut context: ReconciliationContext,
    deps: WorkerDeps,
) -> ReconciliationContext {
    info!("Reconcile worker started");

    while let Some(trigger) = rx.recv().await {
        match trigger {
            Trigger::Message(raw) => context.dispatch(&raw),
            Trigger::RetryDue {
                portfolio_uuid,
                timer,
            } => {
                let resolution = context.on_retry_timer(&portfolio_uuid, timer);
                debug!("Retry {} for {}: {:?}", timer, portfolio_uuid, resolution);
            }
            Trigger::RegionExpanded { portfolio_uuid } => {
                if let Some(ticket) = context.region_expanded(&portfolio_uuid) {
                    spawn_fetch(ticket, &deps);
                }
            }
            Trigger::SurfaceAttached { portfolio_uuid } => {
                let generation = context.surface_attached(&portfolio_uuid);
                let flushed = context.flush_pending(&portfolio_uuid);
                debug!(
                    "Region {} attached (generation {}), flush: {:?}",
                    portfolio_uuid, generation, flushed
                );
            }
            Trigger::FetchCompleted { ticket, response } => {
                match context.complete_fetch(&ticket, response) {
                    Ok(applied) => debug!(
                        "Fetch for {} (generation {}) applied: {}",
                        ticket.portfolio_uuid, ticket.generation, applied
                    ),
                    Err(e) => error!("Failed to apply fetch for {}: {}", ticket.portfolio_uuid, e),
                }
            }
        }
    }

    info!("Reconcile worker shutting down");
    context
}

/// Fetches in the background once a region exists, then posts the result.
fn spawn_fetch(ticket: FetchTicket, deps: &WorkerDeps) {
    let Some(tx) = deps.tx.upgrade() else {
        debug!("Worker shutting down, skipping fetch for {}", ticket.portfolio_uuid);
        return;
    };
    let surface = deps.surface.clone();
    let fetcher = deps.fetcher.clone();
    let interval = deps.surface_poll_interval;
    let timeout = deps.surface_wait_timeout;

    tokio::spawn(async move {
        if !wait_for_surface(surface.as_ref(), &ticket.portfolio_uuid, interval, timeout).await {
            return;
        }
        let response = fetcher.fetch_positions(&ticket.portfolio_uuid).await;
        if tx.send(Trigger::FetchCompleted { ticket, response }).is_err() {
            debug!("Worker stopped before fetch result arrived");
        }
    });
}
