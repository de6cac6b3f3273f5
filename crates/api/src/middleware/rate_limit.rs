//! Per-client rate limiting using governor and `tower_governor`.
//!
//! - `checkout_rate_limiter`: checkout and payment routes (~10/min)
//! - `api_rate_limiter`: cart and order routes (~100/min)
//!
//! The Paystack webhook route is not limited.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers consulted for the client address, most specific first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor that reads the client IP from reverse-proxy headers, then
/// from the peer address when the server was started with connect info.
///
/// For `X-Forwarded-For` only the first (client) hop is used.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

/// Rate limiter for checkout routes: ~10 requests per minute per IP.
///
/// One token every 6 seconds, burst of 5. Each checkout call can reach the
/// payment gateway, so this is kept tight.
///
/// # Panics
///
/// Never: the replenish period and burst are non-zero constants, which
/// `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    #[allow(clippy::expect_used)]
    limiter(6, 5).expect("rate limiter config with per_second(6) and burst_size(5) is valid")
}

/// Rate limiter for cart and order routes: ~100 requests per minute per IP.
///
/// # Panics
///
/// Never: the replenish period and burst are non-zero constants.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    #[allow(clippy::expect_used)]
    limiter(1, 50).expect("rate limiter config with per_second(1) and burst_size(50) is valid")
}
