//! Reassembly of chunked position lists.
//!
//! Per portfolio the buffer moves through:
//!
//! ```text
//! empty ──chunk──▶ accumulating(expected, chunks) ──last chunk──▶ complete (entry removed)
//!                     │    ▲
//!                     └────┘ expected count changed: prior chunks discarded
//! ```
//!
//! An error-bearing message for the portfolio clears its entry unconditionally.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use crate::errors::MessageError;

#[derive(Debug)]
struct ChunkEntry<T> {
    expected_count: u32,
    chunks: BTreeMap<u32, Vec<T>>,
}

/// Accumulates chunk-indexed partial lists until every chunk has arrived.
#[derive(Debug)]
pub struct ChunkBuffer<T> {
    entries: HashMap<String, ChunkEntry<T>>,
}

impl<T> Default for ChunkBuffer<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ChunkBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds chunk `index` (1-based) of `count` for a portfolio.
    ///
    /// Returns `Ok(None)` while chunks are missing and the items of chunks
    /// `1..=count` concatenated in index order once complete. Arrival order
    /// does not matter; a repeated index replaces the earlier chunk. A count
    /// of one or less bypasses buffering.
    pub fn ingest(
        &mut self,
        portfolio_uuid: &str,
        index: u32,
        count: u32,
        items: Vec<T>,
    ) -> Result<Option<Vec<T>>, MessageError> {
        if count <= 1 {
            if self.entries.remove(portfolio_uuid).is_some() {
                debug!(
                    "Unchunked update for {} supersedes partial reassembly",
                    portfolio_uuid
                );
            }
            return Ok(Some(items));
        }
        if index == 0 || index > count {
            return Err(MessageError::ChunkOutOfRange { index, count });
        }

        let entry = self
            .entries
            .entry(portfolio_uuid.to_string())
            .or_insert_with(|| ChunkEntry {
                expected_count: count,
                chunks: BTreeMap::new(),
            });

        if entry.expected_count != count {
            warn!(
                "Chunk count for {} changed from {} to {}, discarding {} buffered chunks",
                portfolio_uuid,
                entry.expected_count,
                count,
                entry.chunks.len()
            );
            entry.expected_count = count;
            entry.chunks.clear();
        }

        entry.chunks.insert(index, items);
        if entry.chunks.len() < count as usize {
            debug!(
                "Buffered chunk {}/{} for {} ({} received)",
                index,
                count,
                portfolio_uuid,
                entry.chunks.len()
            );
            return Ok(None);
        }

        let completed = self
            .entries
            .remove(portfolio_uuid)
            .map(|entry| entry.chunks.into_values().flatten().collect())
            .unwrap_or_default();
        Ok(Some(completed))
    }

    /// Drops any partial reassembly for a portfolio. Returns whether one existed.
    pub fn clear(&mut self, portfolio_uuid: &str) -> bool {
        self.entries.remove(portfolio_uuid).is_some()
    }

    /// `(received, expected)` for a portfolio mid-reassembly.
    pub fn progress(&self, portfolio_uuid: &str) -> Option<(usize, u32)> {
        self.entries
            .get(portfolio_uuid)
            .map(|entry| (entry.chunks.len(), entry.expected_count))
    }

    pub fn is_accumulating(&self, portfolio_uuid: &str) -> bool {
        self.entries.contains_key(portfolio_uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
