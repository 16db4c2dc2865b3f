//! Rate limiting middleware using tower-governor
//!
//! Clients are keyed by IP. `X-Forwarded-For`, `X-Real-Ip` and `Forwarded`
//! are honoured before falling back to the peer address, so the router must
//! be served with `into_make_service_with_connect_info::<SocketAddr>()`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

use crate::error::AppError;

/// Default sustained requests per second per client.
pub const DEFAULT_REQUESTS_PER_SECOND: u64 = 10;

/// Default burst allowance per client.
pub const DEFAULT_BURST_SIZE: u32 = 10;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per second allowed once the burst is spent
    pub requests_per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst_size: DEFAULT_BURST_SIZE,
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.enabled),
            requests_per_second: std::env::var("RATE_LIMIT_REQUESTS_PER_SECOND")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.requests_per_second),
            burst_size: std::env::var("RATE_LIMIT_BURST_SIZE")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.burst_size),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.requests_per_second == 0 {
            anyhow::bail!("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than 0");
        }
        if self.burst_size == 0 {
            anyhow::bail!("RATE_LIMIT_BURST_SIZE must be greater than 0");
        }
        Ok(())
    }

    /// Milliseconds between replenished permits, at least 1
    fn replenish_interval_ms(&self) -> u64 {
        (1000 / self.requests_per_second.max(1)).max(1)
    }
}

/// Wrap every route of `router` in the per-client rate limiter
///
/// A no-op when the limiter is disabled. Rejected requests get the JSON
/// `RESOURCE_EXHAUSTED` body; the governor's `retry-after` style headers are
/// kept.
pub fn apply_rate_limit<S>(router: Router<S>, config: &RateLimitConfig) -> anyhow::Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    if !config.enabled {
        tracing::info!("Rate limiting disabled");
        return Ok(router);
    }

    config.validate()?;

    let governor_conf = GovernorConfigBuilder::default()
        .per_millisecond(config.replenish_interval_ms())
        .burst_size(config.burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration: {:?}", config))?;

    tracing::info!(
        requests_per_second = config.requests_per_second,
        burst_size = config.burst_size,
        "Rate limiting enabled"
    );

    Ok(router
        .layer(GovernorLayer {
            config: Arc::new(governor_conf),
        })
        .layer(axum::middleware::map_response(rate_limited_json)))
}

async fn rate_limited_json(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut rewritten = AppError::RateLimited.into_response();

    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().insert(name.clone(), value.clone());
        }
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use serial_test::serial;

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.burst_size, 10);
        assert_eq!(config.replenish_interval_ms(), 100);
    }

    #[test]
    #[serial]
    fn test_rate_limit_config_from_env() {
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("RATE_LIMIT_REQUESTS_PER_SECOND", "50");
        std::env::set_var("RATE_LIMIT_BURST_SIZE", "5");

        let config = RateLimitConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.requests_per_second, 50);
        assert_eq!(config.burst_size, 5);

        std::env::remove_var("RATE_LIMIT_ENABLED");
        std::env::remove_var("RATE_LIMIT_REQUESTS_PER_SECOND");
        std::env::remove_var("RATE_LIMIT_BURST_SIZE");
    }

    #[test]
    fn test_high_rate_keeps_positive_interval() {
        let config = RateLimitConfig {
            requests_per_second: 5000,
            ..Default::default()
        };
        assert_eq!(config.replenish_interval_ms(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(RateLimitConfig::default().validate().is_ok());

        let zero_burst = RateLimitConfig {
            burst_size: 0,
            ..Default::default()
        };
        assert!(zero_burst.validate().is_err());
    }

    #[test]
    fn test_apply_rate_limit_rejects_invalid_config() {
        let config = RateLimitConfig {
            requests_per_second: 0,
            ..Default::default()
        };
        assert!(apply_rate_limit(Router::<()>::new(), &config).is_err());
        assert!(apply_rate_limit(Router::<()>::new(), &RateLimitConfig::disabled()).is_ok());
    }

    #[tokio::test]
    async fn test_rate_limited_json_rewrites_429() {
        let response = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header("retry-after", "1")
            .body(Body::from("Too Many Requests! Wait for 1s"))
            .unwrap();

        let rewritten = rate_limited_json(response).await;
        assert_eq!(rewritten.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rewritten.headers()["retry-after"], "1");

        let body = to_bytes(rewritten.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "RESOURCE_EXHAUSTED");
        assert_eq!(json["code"], 429);
    }

    #[tokio::test]
    async fn test_rate_limited_json_passes_other_responses() {
        let response = Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("[]"))
            .unwrap();

        let passed = rate_limited_json(response).await;
        assert_eq!(passed.status(), StatusCode::OK);
    }
}
