//! Harvest configuration with sensible defaults.
//!
//! [`HarvestConfig`] controls the places provider endpoint, pagination and
//! retry policy, per-stage timeouts and the export directory. The defaults
//! embody the provider's documented constraints (a continuation token is
//! not usable for roughly two seconds after it is issued).

use std::path::PathBuf;

use crate::error::HarvestError;

/// Configuration for the discovery and enrichment engine.
///
/// Use [`HarvestConfig::new`] with an API key, or construct with field
/// overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Places provider API key.
    pub api_key: String,
    /// Places provider base URL (no trailing slash).
    pub base_url: String,
    /// Mandatory delay before a continuation token is used, in milliseconds.
    pub page_delay_ms: u64,
    /// Total attempts per page fetch, including the first.
    pub retry_attempts: u32,
    /// Fixed delay between retry attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Ceiling on the retry delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Timeout for a text-search page request, in seconds.
    pub search_timeout_secs: u64,
    /// Timeout for a place-detail request, in seconds.
    pub detail_timeout_secs: u64,
    /// Timeout for a website fetch during email scraping, in seconds.
    pub scrape_timeout_secs: u64,
    /// TTL for cached place-detail responses, in seconds. 0 disables caching.
    pub detail_cache_ttl_secs: u64,
    /// Directory export files are written to. Created on demand.
    pub export_dir: PathBuf,
    /// Custom User-Agent. If `None`, rotates through a built-in list of
    /// realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://maps.googleapis.com/maps/api/place".into(),
            page_delay_ms: 2_000,
            retry_attempts: 3,
            retry_delay_ms: 2_000,
            max_backoff_ms: 10_000,
            search_timeout_secs: 30,
            detail_timeout_secs: 10,
            scrape_timeout_secs: 15,
            detail_cache_ttl_secs: 600,
            export_dir: PathBuf::from("exports"),
            user_agent: None,
        }
    }
}

impl HarvestConfig {
    /// Default configuration with the given provider API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `base_url` must not be empty
    /// - `retry_attempts` must be greater than 0
    /// - `retry_delay_ms` must not exceed `max_backoff_ms`
    /// - all timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.base_url.trim().is_empty() {
            return Err(HarvestError::Config("base_url must not be empty".into()));
        }
        if self.retry_attempts == 0 {
            return Err(HarvestError::Config(
                "retry_attempts must be greater than 0".into(),
            ));
        }
        if self.retry_delay_ms > self.max_backoff_ms {
            return Err(HarvestError::Config(
                "retry_delay_ms must be <= max_backoff_ms".into(),
            ));
        }
        if self.search_timeout_secs == 0
            || self.detail_timeout_secs == 0
            || self.scrape_timeout_secs == 0
        {
            return Err(HarvestError::Config(
                "timeouts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_embodies_provider_policy() {
        let config = HarvestConfig::default();
        assert_eq!(config.page_delay_ms, 2_000);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 2_000);
        assert_eq!(config.max_backoff_ms, 10_000);
        assert_eq!(config.detail_timeout_secs, 10);
        assert_eq!(config.scrape_timeout_secs, 15);
    }

    #[test]
    fn default_base_url_points_at_places_api() {
        let config = HarvestConfig::default();
        assert!(config.base_url.starts_with("https://"));
        assert!(!config.base_url.ends_with('/'));
    }

    #[test]
    fn new_sets_api_key() {
        let config = HarvestConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_base_url_rejected() {
        let config = HarvestConfig {
            base_url: "  ".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn zero_retry_attempts_rejected() {
        let config = HarvestConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_attempts"));
    }

    #[test]
    fn retry_delay_above_ceiling_rejected() {
        let config = HarvestConfig {
            retry_delay_ms: 20_000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_backoff_ms"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = HarvestConfig {
            scrape_timeout_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeouts"));
    }

    #[test]
    fn custom_user_agent_accepted() {
        let config = HarvestConfig {
            user_agent: Some("HarvestBot/1.0".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
