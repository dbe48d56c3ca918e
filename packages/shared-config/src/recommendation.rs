//! Recommendation engine configuration types

use crate::{parse_env, ConfigError, ConfigResult};

/// Tuning knobs for the recommendation pipeline and the skip-burst detector
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Rolling window for skip-burst detection, in seconds
    pub skip_window_secs: u64,

    /// Number of skips within the window that triggers a push refresh
    pub skip_threshold: u32,

    /// TTL for cached recommendation responses, in seconds
    pub cache_ttl_secs: u64,

    /// Maximum run of consecutive tracks by the same artist
    pub max_same_artist: usize,

    /// Default number of tracks per response when the request omits a limit
    pub default_limit: usize,

    /// Whether the interest-graph bias is consulted at all
    pub interest_graph_enabled: bool,

    /// Deadline applied to each request's store and cache calls, in seconds
    pub request_timeout_secs: u64,
}

impl RecommendationConfig {
    /// Load recommendation configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            skip_window_secs: parse_env("SKIP_DETECTION_WINDOW_SECS", 60)?,
            skip_threshold: parse_env("SKIP_DETECTION_THRESHOLD", 2)?,
            cache_ttl_secs: parse_env("RECOMMENDATION_CACHE_TTL_SECS", 300)?,
            max_same_artist: parse_env("MAX_SAME_ARTIST", 3)?,
            default_limit: parse_env("DEFAULT_RECOMMENDATION_LIMIT", 20)?,
            interest_graph_enabled: parse_env("INTEREST_GRAPH_ENABLED", true)?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 10)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.skip_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "SKIP_DETECTION_THRESHOLD must be at least 1".to_string(),
            ));
        }
        if self.max_same_artist == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_SAME_ARTIST must be at least 1".to_string(),
            ));
        }
        if self.default_limit == 0 || self.default_limit > 50 {
            return Err(ConfigError::ValidationError(
                "DEFAULT_RECOMMENDATION_LIMIT must be in 1..=50".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            skip_window_secs: 60,
            skip_threshold: 2,
            cache_ttl_secs: 300,
            max_same_artist: 3,
            default_limit: 20,
            interest_graph_enabled: true,
            request_timeout_secs: 10,
        }
    }
}
