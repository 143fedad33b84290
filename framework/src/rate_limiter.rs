use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};

pub type RateLimitConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per peer IP limit: one request replenished every `seconds_per_request`,
/// up to `burst` at once. `None` when either value is zero.
#[must_use]
pub fn general_rate_limit(seconds_per_request: u64, burst: u32) -> Option<RateLimitConfig> {
    GovernorConfigBuilder::default()
        .seconds_per_request(seconds_per_request)
        .burst_size(burst)
        .finish()
}

/// Middleware sharing the limiter state held by `config`.
#[must_use]
pub fn rate_limiter(config: &RateLimitConfig) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    Governor::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_rejected() {
        assert!(general_rate_limit(0, 100).is_none());
        assert!(general_rate_limit(1, 0).is_none());
        assert!(general_rate_limit(1, 100).is_some());
    }
}
