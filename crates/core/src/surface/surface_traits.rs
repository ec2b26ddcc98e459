//! Rendering surface capability.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::positions::PositionRecord;

/// Positions ready to render for one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsView {
    pub portfolio_uuid: String,
    pub positions: Vec<PositionRecord>,
}

/// An upstream error to render in place of the positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub portfolio_uuid: String,
    pub message: String,
    /// Whether the surface should offer a retry action
    pub retryable: bool,
}

/// Per-portfolio region the core renders into.
///
/// Implemented by the rendering collaborator. The core never assumes a
/// region exists; anything not ready is queued and retried.
///
/// # Design Rules
///
/// - `exists()`/`is_visible()` must be cheap and side-effect free
/// - `write()`/`write_error()` must not call back into the core
pub trait RenderingSurface: Send + Sync {
    /// Whether a region for the portfolio is mounted.
    fn exists(&self, portfolio_uuid: &str) -> bool;

    /// Whether the mounted region is expanded.
    fn is_visible(&self, portfolio_uuid: &str) -> bool;

    fn write(&self, view: &PositionsView) -> Result<()>;

    fn write_error(&self, view: &ErrorView) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionState {
    visible: bool,
    reject_writes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedContent {
    Positions(PositionsView),
    Error(ErrorView),
}

/// In-memory surface for tests - regions are toggled by hand and writes collected.
#[derive(Clone, Default)]
pub struct MockRenderingSurface {
    regions: Arc<Mutex<HashMap<String, RegionState>>>,
    writes: Arc<Mutex<Vec<RenderedContent>>>,
}

impl MockRenderingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts (or re-shows) a region.
    pub fn mount(&self, portfolio_uuid: &str, visible: bool) {
        self.regions.lock().unwrap().insert(
            portfolio_uuid.to_string(),
            RegionState {
                visible,
                reject_writes: false,
            },
        );
    }

    pub fn unmount(&self, portfolio_uuid: &str) {
        self.regions.lock().unwrap().remove(portfolio_uuid);
    }

    /// Makes writes to a mounted region fail.
    pub fn reject_writes(&self, portfolio_uuid: &str) {
        if let Some(region) = self.regions.lock().unwrap().get_mut(portfolio_uuid) {
            region.reject_writes = true;
        }
    }

    /// Returns all rendered content in write order.
    pub fn writes(&self) -> Vec<RenderedContent> {
        self.writes.lock().unwrap().clone()
    }

    /// Returns the most recent content written for a portfolio.
    pub fn last_write(&self, portfolio_uuid: &str) -> Option<RenderedContent> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|content| match content {
                RenderedContent::Positions(view) => view.portfolio_uuid == portfolio_uuid,
                RenderedContent::Error(view) => view.portfolio_uuid == portfolio_uuid,
            })
            .cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn accept(&self, portfolio_uuid: &str, content: RenderedContent) -> Result<()> {
        let rejected = self
            .regions
            .lock()
            .unwrap()
            .get(portfolio_uuid)
            .map_or(true, |region| region.reject_writes);
        if rejected {
            return Err(Error::Surface(format!("region {} rejected write", portfolio_uuid)));
        }
        self.writes.lock().unwrap().push(content);
        Ok(())
    }
}

impl RenderingSurface for MockRenderingSurface {
    fn exists(&self, portfolio_uuid: &str) -> bool {
        self.regions.lock().unwrap().contains_key(portfolio_uuid)
    }

    fn is_visible(&self, portfolio_uuid: &str) -> bool {
        self.regions
            .lock()
            .unwrap()
            .get(portfolio_uuid)
            .is_some_and(|region| region.visible)
    }

    fn write(&self, view: &PositionsView) -> Result<()> {
        self.accept(&view.portfolio_uuid, RenderedContent::Positions(view.clone()))
    }

    fn write_error(&self, view: &ErrorView) -> Result<()> {
        self.accept(&view.portfolio_uuid, RenderedContent::Error(view.clone()))
    }
}
