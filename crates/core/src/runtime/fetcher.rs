use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use crate::errors::Result;
use crate::messages::PortfolioPositionsMessage;
use crate::surface::RenderingSurface;

/// Loads a portfolio's positions on demand (lazy load on region expand).
///
/// The response has the shape of a push message and goes through the same
/// merge path once the worker receives it.
#[async_trait]
pub trait PositionsFetcher: Send + Sync {
    async fn fetch_positions(&self, portfolio_uuid: &str) -> Result<PortfolioPositionsMessage>;
}

/// Polls until the surface has a region for the portfolio.
///
/// Re-checks every `interval` and gives up with `false` once `timeout`
/// elapses. A timeout past the clock's range never expires.
pub async fn wait_for_surface(
    surface: &dyn RenderingSurface,
    portfolio_uuid: &str,
    interval: Duration,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if surface.exists(portfolio_uuid) {
            return true;
        }
        let now = Instant::now();
        let remaining = match deadline {
            Some(deadline) if now >= deadline => {
                debug!(
                    "No region for {} after {:?}, giving up",
                    portfolio_uuid, timeout
                );
                return false;
            }
            Some(deadline) => deadline - now,
            None => interval,
        };
        tokio::time::sleep(interval.min(remaining)).await;
    }
}
