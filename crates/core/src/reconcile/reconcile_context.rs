//! Per-dashboard reconciliation state and the handlers that mutate it.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;

use super::reconcile_model::FetchTicket;
use crate::accounts::{recompute_account_totals, AccountRecord, AccountTotals};
use crate::aggregate::{recompute_footer, FooterRow, FooterTotals};
use crate::chunks::ChunkBuffer;
use crate::config::ReconcileConfig;
use crate::constants::{
    DATA_TYPE_ACCOUNTS, DATA_TYPE_PORTFOLIO_POSITIONS, DATA_TYPE_PORTFOLIO_VALUES,
};
use crate::diagnostics::{
    DiagnosticsChange, DiagnosticsDiffer, DiagnosticsKind, DiagnosticsSnapshot,
};
use crate::errors::{Error, MessageError, Result};
use crate::events::{DomainEventSink, ReconcileEvent};
use crate::messages::{
    decode_message, parse_envelope, InboundMessage, LastFileUpdate, PortfolioPositionsMessage,
};
use crate::pending::{DeliveryOutcome, PendingQueue, RetryResolution};
use crate::portfolios::{upsert_portfolio, PortfolioPatch, PortfolioRecord};
use crate::positions::{merge_positions, PositionPatch, PositionRecord};
use crate::scheduler::{RetryScheduler, TimerId};
use crate::surface::RenderingSurface;
use crate::utils::{Clock, SystemClock};

/// State of one dashboard instance.
///
/// Every handler performs its read-merge-write on a cache slot without
/// suspending, so the context needs no internal locking. Owners that run
/// handlers from several tasks serialize them (see the runtime module).
pub struct ReconciliationContext {
    config: ReconcileConfig,
    surface: Arc<dyn RenderingSurface>,
    scheduler: Arc<dyn RetryScheduler>,
    event_sink: Arc<dyn DomainEventSink>,
    clock: Arc<dyn Clock>,

    accounts: Vec<AccountRecord>,
    account_totals: AccountTotals,
    portfolios: HashMap<String, PortfolioRecord>,
    /// First-seen order of portfolios announced by value updates
    portfolio_order: Vec<String>,
    footer: FooterTotals,
    last_file_update: Option<LastFileUpdate>,

    chunks: ChunkBuffer<PositionPatch>,
    pending: PendingQueue,
    diagnostics: DiagnosticsDiffer,
    generations: HashMap<String, u64>,
}

impl ReconciliationContext {
    pub fn new(
        config: ReconcileConfig,
        surface: Arc<dyn RenderingSurface>,
        scheduler: Arc<dyn RetryScheduler>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        let pending = PendingQueue::new(config.retry_delay, config.max_retry_attempts);
        Self {
            config,
            surface,
            scheduler,
            event_sink,
            clock: Arc::new(SystemClock),
            accounts: Vec::new(),
            account_totals: AccountTotals::default(),
            portfolios: HashMap::new(),
            portfolio_order: Vec::new(),
            footer: FooterTotals::default(),
            last_file_update: None,
            chunks: ChunkBuffer::new(),
            pending,
            diagnostics: DiagnosticsDiffer::new(),
            generations: HashMap::new(),
        }
    }

    /// Replaces the clock used for event timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // =========================================================================
    // Inbound messages
    // =========================================================================

    /// Handles one raw push message.
    ///
    /// Failures are logged and swallowed: a malformed message must never
    /// block the ones after it.
    pub fn dispatch(&mut self, raw: &Value) {
        if let Err(e) = self.handle(raw) {
            error!("Failed to handle inbound message: {}", e);
        }
    }

    /// Like [`dispatch`](Self::dispatch) but reports the failure.
    pub fn handle(&mut self, raw: &Value) -> Result<()> {
        let envelope = parse_envelope(raw)?;
        if !self.config.accepts_entry(envelope.entry_id.as_deref()) {
            debug!(
                "Ignoring {} message for entry {:?}",
                envelope.data_type, envelope.entry_id
            );
            return Ok(());
        }

        match decode_message(&envelope)? {
            InboundMessage::Accounts(accounts) => self.apply_accounts(accounts),
            InboundMessage::PortfolioValues(patches) => self.apply_portfolio_values(patches),
            InboundMessage::PortfolioPositions(messages) => {
                for message in messages {
                    let portfolio_uuid = message.portfolio_uuid.clone();
                    if let Err(e) = self.apply_positions(message) {
                        warn!("Dropping positions update for {}: {}", portfolio_uuid, e);
                    }
                }
            }
            InboundMessage::LastFileUpdate(update) => self.apply_last_file_update(update),
            InboundMessage::Unknown(data_type) => {
                debug!("Ignoring message with unknown data_type '{}'", data_type);
            }
        }
        Ok(())
    }

    /// Replaces the account list.
    pub fn apply_accounts(&mut self, accounts: Vec<AccountRecord>) {
        let now = self.clock.now();
        let mut changes = Vec::new();

        for previous in &self.accounts {
            if !accounts.iter().any(|account| account.uuid == previous.uuid) {
                changes.extend(self.diagnostics.diff(
                    DiagnosticsKind::Account,
                    &previous.uuid,
                    DATA_TYPE_ACCOUNTS,
                    None,
                    now,
                ));
            }
        }
        for account in &accounts {
            changes.extend(self.diagnostics.diff(
                DiagnosticsKind::Account,
                &account.uuid,
                DATA_TYPE_ACCOUNTS,
                account.diagnostics_snapshot(),
                now,
            ));
        }

        self.account_totals = recompute_account_totals(&accounts);
        debug!(
            "Replaced {} accounts with {} (incomplete totals: {})",
            self.accounts.len(),
            accounts.len(),
            self.account_totals.incomplete
        );
        let account_uuids = accounts.iter().map(|account| account.uuid.clone()).collect();
        self.accounts = accounts;

        self.event_sink
            .emit(ReconcileEvent::accounts_replaced(account_uuids));
        self.emit_changes(changes);
    }

    /// Upserts portfolio rows field by field and refreshes the footer.
    pub fn apply_portfolio_values(&mut self, patches: Vec<PortfolioPatch>) {
        let now = self.clock.now();
        let mut changes = Vec::new();
        let mut upserted = Vec::with_capacity(patches.len());

        for patch in &patches {
            let record = upsert_portfolio(self.portfolios.get(&patch.uuid), patch);
            let snapshot = if patch.carries_diagnostics() {
                record.diagnostics_snapshot()
            } else {
                None
            };
            changes.extend(self.diagnostics.diff(
                DiagnosticsKind::Portfolio,
                &patch.uuid,
                DATA_TYPE_PORTFOLIO_VALUES,
                snapshot,
                now,
            ));

            if !self.portfolio_order.contains(&patch.uuid) {
                self.portfolio_order.push(patch.uuid.clone());
            }
            self.portfolios.insert(patch.uuid.clone(), record);
            upserted.push(patch.uuid.clone());
        }

        if !upserted.is_empty() {
            self.event_sink
                .emit(ReconcileEvent::portfolios_upserted(upserted));
        }
        self.emit_changes(changes);
        self.refresh_footer();
    }

    /// Handles positions (or an upstream error) for one portfolio.
    ///
    /// Flow: error short-circuit, chunk reassembly, merge into the cache,
    /// delivery or queueing, diagnostics. Footer rows do not depend on
    /// positions, so the footer is left alone.
    pub fn apply_positions(&mut self, message: PortfolioPositionsMessage) -> Result<()> {
        let portfolio_uuid = message.portfolio_uuid.clone();

        if let Some(error) = message.error {
            if self.chunks.clear(&portfolio_uuid) {
                debug!("Upstream error for {} discards partial reassembly", portfolio_uuid);
            }
            info!("Positions for {} failed upstream: {}", portfolio_uuid, error);
            let cached = self.cached_positions(&portfolio_uuid);
            self.pending.deliver_or_queue(
                self.surface.as_ref(),
                self.scheduler.as_ref(),
                &portfolio_uuid,
                cached,
                Some(error),
            );
            return Ok(());
        }

        let count = message.chunk_count.unwrap_or(1);
        let index = match message.chunk_index {
            Some(index) => index,
            None if count <= 1 => 1,
            None => return Err(MessageError::MissingField("chunk_index".to_string()).into()),
        };
        let snapshot = DiagnosticsSnapshot::from_parts(
            message.coverage_ratio,
            message.provenance,
            message.metric_run_uuid,
            message.generated_at,
        );
        let Some(patches) = self
            .chunks
            .ingest(&portfolio_uuid, index, count, message.positions)?
        else {
            return Ok(());
        };

        let merged = self.merge_into_cache(&portfolio_uuid, &patches);
        let security_uuids = merged
            .iter()
            .map(|position| position.security_uuid.clone())
            .collect();
        self.event_sink.emit(ReconcileEvent::positions_updated(
            portfolio_uuid.clone(),
            security_uuids,
        ));

        self.pending.deliver_or_queue(
            self.surface.as_ref(),
            self.scheduler.as_ref(),
            &portfolio_uuid,
            merged,
            None,
        );

        let change = self.diagnostics.diff(
            DiagnosticsKind::PortfolioPositions,
            &portfolio_uuid,
            DATA_TYPE_PORTFOLIO_POSITIONS,
            snapshot,
            self.clock.now(),
        );
        self.emit_changes(change);
        Ok(())
    }

    pub fn apply_last_file_update(&mut self, update: LastFileUpdate) {
        debug!("Backing file updated at {}", update.raw);
        self.event_sink.emit(ReconcileEvent::last_file_updated(
            update.raw.clone(),
            update.timestamp,
        ));
        self.last_file_update = Some(update);
    }

    // =========================================================================
    // Retry and user-driven triggers
    // =========================================================================

    /// Handles a fired retry timer.
    pub fn on_retry_timer(&mut self, portfolio_uuid: &str, timer: TimerId) -> RetryResolution {
        self.pending.on_retry(
            self.surface.as_ref(),
            self.scheduler.as_ref(),
            portfolio_uuid,
            timer,
        )
    }

    /// Offers a queued update to the surface now, independent of its timer.
    pub fn flush_pending(&mut self, portfolio_uuid: &str) -> Option<DeliveryOutcome> {
        self.pending.flush(
            self.surface.as_ref(),
            self.scheduler.as_ref(),
            portfolio_uuid,
        )
    }

    /// The user expanded a portfolio's region.
    ///
    /// Flushes a queued update if there is one. Otherwise, when no positions
    /// were ever loaded, returns a ticket for a fresh fetch.
    pub fn region_expanded(&mut self, portfolio_uuid: &str) -> Option<FetchTicket> {
        if let Some(outcome) = self.flush_pending(portfolio_uuid) {
            debug!("Region {} expanded, flushed queued update: {:?}", portfolio_uuid, outcome);
            return None;
        }
        let loaded = self
            .portfolios
            .get(portfolio_uuid)
            .is_some_and(|record| record.positions.is_some());
        if loaded {
            return None;
        }
        Some(self.begin_fetch(portfolio_uuid))
    }

    /// A region for the portfolio was (re)mounted. In-flight fetches started
    /// before this point become stale.
    pub fn surface_attached(&mut self, portfolio_uuid: &str) -> u64 {
        self.bump_generation(portfolio_uuid)
    }

    /// Starts a lazy-load request, superseding any request still in flight.
    pub fn begin_fetch(&mut self, portfolio_uuid: &str) -> FetchTicket {
        FetchTicket {
            portfolio_uuid: portfolio_uuid.to_string(),
            generation: self.bump_generation(portfolio_uuid),
        }
    }

    /// Applies a fetch response if its ticket is still the latest request.
    ///
    /// Returns whether the response was applied.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        response: Result<PortfolioPositionsMessage>,
    ) -> Result<bool> {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale fetch for {} (generation {}, current {})",
                ticket.portfolio_uuid,
                ticket.generation,
                self.generation(&ticket.portfolio_uuid)
            );
            return Ok(false);
        }

        let message = match response {
            Ok(message) if message.portfolio_uuid == ticket.portfolio_uuid => message,
            Ok(message) => {
                return Err(Error::Fetch(format!(
                    "response for {} answered a request for {}",
                    message.portfolio_uuid, ticket.portfolio_uuid
                )))
            }
            Err(e) => {
                warn!("Fetch for {} failed: {}", ticket.portfolio_uuid, e);
                PortfolioPositionsMessage::failed(ticket.portfolio_uuid.clone(), e.to_string())
            }
        };
        self.apply_positions(message)?;
        Ok(true)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generation(&ticket.portfolio_uuid) == ticket.generation
    }

    pub fn generation(&self, portfolio_uuid: &str) -> u64 {
        self.generations.get(portfolio_uuid).copied().unwrap_or(0)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    pub fn account_totals(&self) -> &AccountTotals {
        &self.account_totals
    }

    pub fn portfolio(&self, portfolio_uuid: &str) -> Option<&PortfolioRecord> {
        self.portfolios.get(portfolio_uuid)
    }

    /// Portfolio rows in first-seen order.
    pub fn portfolios(&self) -> Vec<&PortfolioRecord> {
        self.portfolio_order
            .iter()
            .filter_map(|uuid| self.portfolios.get(uuid))
            .collect()
    }

    pub fn positions(&self, portfolio_uuid: &str) -> Option<&[PositionRecord]> {
        self.portfolios
            .get(portfolio_uuid)
            .and_then(|record| record.positions.as_deref())
    }

    pub fn footer(&self) -> &FooterTotals {
        &self.footer
    }

    pub fn last_file_update(&self) -> Option<&LastFileUpdate> {
        self.last_file_update.as_ref()
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// `(received, expected)` chunks for a portfolio mid-reassembly.
    pub fn chunk_progress(&self, portfolio_uuid: &str) -> Option<(usize, u32)> {
        self.chunks.progress(portfolio_uuid)
    }

    pub fn diagnostics(&self) -> &DiagnosticsDiffer {
        &self.diagnostics
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn cached_positions(&self, portfolio_uuid: &str) -> Vec<PositionRecord> {
        self.positions(portfolio_uuid)
            .map(<[PositionRecord]>::to_vec)
            .unwrap_or_default()
    }

    /// Read-merge-write of one portfolio's position list.
    ///
    /// Positions for a portfolio no value update has announced yet are cached
    /// on a bare record that stays out of the footer until it is announced.
    fn merge_into_cache(
        &mut self,
        portfolio_uuid: &str,
        patches: &[PositionPatch],
    ) -> Vec<PositionRecord> {
        let record = self
            .portfolios
            .entry(portfolio_uuid.to_string())
            .or_insert_with(|| PortfolioRecord::new(portfolio_uuid));
        let previous = record.positions.as_deref().unwrap_or_default();
        let merged = merge_positions(previous, patches);
        debug!(
            "Merged {} positions into {} ({} cached before)",
            merged.len(),
            portfolio_uuid,
            previous.len()
        );
        record.positions = Some(merged.clone());
        merged
    }

    fn refresh_footer(&mut self) {
        let rows: Vec<FooterRow> = self
            .portfolio_order
            .iter()
            .filter_map(|uuid| self.portfolios.get(uuid))
            .map(FooterRow::from)
            .collect();
        let totals = recompute_footer(&rows);
        if totals != self.footer {
            self.footer = totals.clone();
            self.event_sink
                .emit(ReconcileEvent::footer_recomputed(totals));
        }
    }

    fn bump_generation(&mut self, portfolio_uuid: &str) -> u64 {
        let generation = self
            .generations
            .entry(portfolio_uuid.to_string())
            .or_insert(0);
        *generation += 1;
        *generation
    }

    fn emit_changes(&self, changes: impl IntoIterator<Item = DiagnosticsChange>) {
        let events: Vec<ReconcileEvent> = changes.into_iter().map(ReconcileEvent::from).collect();
        if !events.is_empty() {
            self.event_sink.emit_batch(events);
        }
    }
}
