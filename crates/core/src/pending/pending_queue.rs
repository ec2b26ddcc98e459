//! Delivery to the rendering surface with a bounded retry queue.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};

use super::pending_model::{DeliveryOutcome, PendingState, PendingUpdate, RetryResolution};
use crate::positions::PositionRecord;
use crate::scheduler::{RetryScheduler, TimerId};
use crate::surface::{ErrorView, PositionsView, RenderingSurface};

/// Offers positions (or an upstream error) to the surface once.
pub fn attempt_delivery(
    surface: &dyn RenderingSurface,
    portfolio_uuid: &str,
    positions: &[PositionRecord],
    error: Option<&str>,
) -> DeliveryOutcome {
    if !surface.exists(portfolio_uuid) {
        return DeliveryOutcome::Missing;
    }
    if !surface.is_visible(portfolio_uuid) {
        return DeliveryOutcome::Hidden;
    }

    let written = match error {
        Some(message) => surface.write_error(&ErrorView {
            portfolio_uuid: portfolio_uuid.to_string(),
            message: message.to_string(),
            retryable: true,
        }),
        None => surface.write(&PositionsView {
            portfolio_uuid: portfolio_uuid.to_string(),
            positions: positions.to_vec(),
        }),
    };

    match written {
        Ok(()) => DeliveryOutcome::Applied,
        Err(e) => {
            warn!("Surface write for {} failed: {}", portfolio_uuid, e);
            DeliveryOutcome::Missing
        }
    }
}

/// Updates waiting for their rendering region, keyed by portfolio.
///
/// Only the latest update per portfolio is kept. Each entry carries one
/// armed retry timer; after `max_attempts` failed retries the entry is
/// dropped without escalation and no further timer is armed. A user-driven
/// flush delivers independently of the timer.
#[derive(Debug)]
pub struct PendingQueue {
    entries: HashMap<String, PendingUpdate>,
    retry_delay: Duration,
    max_attempts: u32,
}

impl PendingQueue {
    pub fn new(retry_delay: Duration, max_attempts: u32) -> Self {
        Self {
            entries: HashMap::new(),
            retry_delay,
            max_attempts,
        }
    }

    /// Delivers now if the surface is ready, otherwise queues and arms a retry.
    ///
    /// Returns `true` when the update was applied.
    pub fn deliver_or_queue(
        &mut self,
        surface: &dyn RenderingSurface,
        scheduler: &dyn RetryScheduler,
        portfolio_uuid: &str,
        positions: Vec<PositionRecord>,
        error: Option<String>,
    ) -> bool {
        let outcome = attempt_delivery(surface, portfolio_uuid, &positions, error.as_deref());
        if outcome.is_applied() {
            self.discard(scheduler, portfolio_uuid);
            return true;
        }

        if let Some(replaced) = self.entries.remove(portfolio_uuid) {
            debug!(
                "Replacing queued update for {} ({} attempts)",
                portfolio_uuid, replaced.attempts
            );
            if let Some(timer) = replaced.timer {
                scheduler.cancel(timer);
            }
        }

        let timer = scheduler.schedule(portfolio_uuid, self.retry_delay);
        debug!(
            "Queued update for {} ({:?}), retry armed as {}",
            portfolio_uuid, outcome, timer
        );
        self.entries.insert(
            portfolio_uuid.to_string(),
            PendingUpdate {
                portfolio_uuid: portfolio_uuid.to_string(),
                positions,
                error,
                attempts: 0,
                state: PendingState::Queued,
                timer: Some(timer),
                last_outcome: outcome,
            },
        );
        false
    }

    /// Handles a fired retry timer.
    pub fn on_retry(
        &mut self,
        surface: &dyn RenderingSurface,
        scheduler: &dyn RetryScheduler,
        portfolio_uuid: &str,
        timer: TimerId,
    ) -> RetryResolution {
        let Some(entry) = self.entries.get_mut(portfolio_uuid) else {
            return RetryResolution::Stale;
        };
        if entry.timer != Some(timer) {
            debug!("Ignoring superseded {} for {}", timer, portfolio_uuid);
            return RetryResolution::Stale;
        }

        entry.state = PendingState::Retrying;
        entry.timer = None;
        let outcome = attempt_delivery(
            surface,
            portfolio_uuid,
            &entry.positions,
            entry.error.as_deref(),
        );
        if outcome.is_applied() {
            debug!(
                "Queued update for {} applied after {} retries",
                portfolio_uuid, entry.attempts
            );
            self.entries.remove(portfolio_uuid);
            return RetryResolution::Applied;
        }

        entry.attempts += 1;
        entry.last_outcome = outcome;
        if entry.attempts >= self.max_attempts {
            let attempts = entry.attempts;
            info!(
                "Dropping queued update for {} after {} retries ({:?})",
                portfolio_uuid, attempts, outcome
            );
            self.entries.remove(portfolio_uuid);
            return RetryResolution::Dropped { attempts };
        }

        entry.state = PendingState::Queued;
        entry.timer = Some(scheduler.schedule(portfolio_uuid, self.retry_delay));
        RetryResolution::Requeued {
            attempts: entry.attempts,
        }
    }

    /// User-triggered delivery of a queued update, independent of its timer.
    ///
    /// Returns `None` when nothing is queued. A failed flush keeps the entry
    /// and its timer untouched and does not count as an attempt.
    pub fn flush(
        &mut self,
        surface: &dyn RenderingSurface,
        scheduler: &dyn RetryScheduler,
        portfolio_uuid: &str,
    ) -> Option<DeliveryOutcome> {
        let entry = self.entries.get(portfolio_uuid)?;
        let outcome = attempt_delivery(
            surface,
            portfolio_uuid,
            &entry.positions,
            entry.error.as_deref(),
        );
        if outcome.is_applied() {
            debug!("Flushed queued update for {}", portfolio_uuid);
            self.discard(scheduler, portfolio_uuid);
        }
        Some(outcome)
    }

    /// Removes an entry and disarms its timer.
    pub fn discard(&mut self, scheduler: &dyn RetryScheduler, portfolio_uuid: &str) -> bool {
        match self.entries.remove(portfolio_uuid) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    scheduler.cancel(timer);
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, portfolio_uuid: &str) -> Option<&PendingUpdate> {
        self.entries.get(portfolio_uuid)
    }

    pub fn contains(&self, portfolio_uuid: &str) -> bool {
        self.entries.contains_key(portfolio_uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
