//! Engine configuration.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS, DEFAULT_SURFACE_POLL_INTERVAL_MS,
    DEFAULT_SURFACE_WAIT_TIMEOUT_MS,
};
use crate::errors::{Error, Result};

/// Tunables for one dashboard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileConfig {
    /// Tenant identifier. Messages tagged with a different entry id are ignored.
    /// `None` accepts every message.
    pub entry_id: Option<String>,

    /// Delay between delivery retries of a queued update (default: 500ms)
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,

    /// Retry ceiling before a queued update is dropped (default: 10)
    pub max_retry_attempts: u32,

    /// Readiness re-check interval while waiting for a surface (default: 100ms)
    #[serde(with = "duration_ms")]
    pub surface_poll_interval: Duration,

    /// Hard timeout for surface waits (default: 5s)
    #[serde(with = "duration_ms")]
    pub surface_wait_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            entry_id: None,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            surface_poll_interval: Duration::from_millis(DEFAULT_SURFACE_POLL_INTERVAL_MS),
            surface_wait_timeout: Duration::from_millis(DEFAULT_SURFACE_WAIT_TIMEOUT_MS),
        }
    }
}

impl ReconcileConfig {
    /// Creates a config bound to one tenant.
    pub fn for_entry(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: Some(entry_id.into()),
            ..Self::default()
        }
    }

    /// Reads `PANEL_*` environment variables, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let entry_id = std::env::var("PANEL_ENTRY_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            entry_id,
            retry_delay: env_millis("PANEL_RETRY_DELAY_MS").unwrap_or(defaults.retry_delay),
            max_retry_attempts: env_parse("PANEL_MAX_RETRY_ATTEMPTS")
                .unwrap_or(defaults.max_retry_attempts),
            surface_poll_interval: env_millis("PANEL_SURFACE_POLL_INTERVAL_MS")
                .unwrap_or(defaults.surface_poll_interval),
            surface_wait_timeout: env_millis("PANEL_SURFACE_WAIT_TIMEOUT_MS")
                .unwrap_or(defaults.surface_wait_timeout),
        }
    }

    /// Rejects values that would make the retry or polling loops degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.max_retry_attempts == 0 {
            return Err(Error::InvalidConfigValue(
                "max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.surface_poll_interval.is_zero() {
            return Err(Error::InvalidConfigValue(
                "surface_poll_interval must be non-zero".to_string(),
            ));
        }
        if self.surface_wait_timeout < self.surface_poll_interval {
            return Err(Error::InvalidConfigValue(
                "surface_wait_timeout must not be shorter than surface_poll_interval".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a message tagged with `entry_id` belongs to this instance.
    pub fn accepts_entry(&self, entry_id: Option<&str>) -> bool {
        match (&self.entry_id, entry_id) {
            (Some(own), Some(other)) => own == other,
            _ => true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable value for {}: {:?}", key, raw);
            None
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconcileConfig::default();
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.max_retry_attempts, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_entry_filter() {
        let config = ReconcileConfig::for_entry("entry-a");
        assert!(config.accepts_entry(Some("entry-a")));
        assert!(!config.accepts_entry(Some("entry-b")));
        assert!(config.accepts_entry(None));

        let open = ReconcileConfig::default();
        assert!(open.accepts_entry(Some("anything")));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = ReconcileConfig {
            max_retry_attempts: 0,
            ..ReconcileConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfigValue(_))
        ));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"entryId":"abc","retryDelay":250}"#).unwrap();
        assert_eq!(config.entry_id.as_deref(), Some("abc"));
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.max_retry_attempts, 10);
    }

    #[test]
    fn test_serialize_saturates_oversized_durations() {
        let config = ReconcileConfig {
            surface_wait_timeout: Duration::MAX,
            ..ReconcileConfig::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["surfaceWaitTimeout"], serde_json::json!(u64::MAX));
        assert_eq!(value["retryDelay"], serde_json::json!(500));
    }
}
