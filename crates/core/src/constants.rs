/// Delay before a queued update is offered to the rendering surface again
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Retry ceiling for a queued update; the entry is dropped once reached
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 10;

/// Interval between readiness checks while waiting for a rendering surface
pub const DEFAULT_SURFACE_POLL_INTERVAL_MS: u64 = 100;

/// Hard timeout for waiting on a rendering surface
pub const DEFAULT_SURFACE_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Inbound `data_type` tags
pub const DATA_TYPE_ACCOUNTS: &str = "accounts";
pub const DATA_TYPE_PORTFOLIO_VALUES: &str = "portfolio_values";
pub const DATA_TYPE_PORTFOLIO_POSITIONS: &str = "portfolio_positions";
pub const DATA_TYPE_LAST_FILE_UPDATE: &str = "last_file_update";

/// Percentage scale used by derived ratios
pub const PERCENT_SCALE: u32 = 100;
