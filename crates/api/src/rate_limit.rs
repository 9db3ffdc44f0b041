//! Per-client rate limiting (GCRA via tower_governor)

use governor::middleware::StateInformationMiddleware;
use session::ServerSettings;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config keyed by peer IP, with X-RateLimit-* headers
pub type AttendanceGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests allowed back to back
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 10,
        }
    }
}

impl From<&ServerSettings> for RateLimitConfig {
    fn from(server: &ServerSettings) -> Self {
        Self {
            per_second: server.rate_limit_per_second,
            burst_size: server.rate_limit_burst,
        }
    }
}

/// Build the governor config. None when either quota is zero.
///
/// Needs `into_make_service_with_connect_info::<SocketAddr>()` so the peer
/// address is available to the key extractor.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<AttendanceGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_server_settings() {
        let config = RateLimitConfig::from(&ServerSettings::default());
        assert_eq!(config, RateLimitConfig::default());
        assert!(create_governor_config(&config).is_some());
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        let config = RateLimitConfig {
            per_second: 1,
            burst_size: 0,
        };
        assert!(create_governor_config(&config).is_none());
    }
}
