//! Sliding-window rate limiting for the login endpoint, tracked per client
//! IP. This is the source of the "too many requests" sign-in error: once a
//! client exhausts its window, further attempts are refused until it expires.

use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use dashmap::DashMap;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::sleep;

use crate::services::auth_service::SignInError;

#[derive(Clone)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Strict limit for credential attempts.
    pub fn login() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(60),
        }
    }
}

struct AttemptTracker {
    attempts: Vec<Instant>,
    last_seen: Instant,
}

impl AttemptTracker {
    fn new() -> Self {
        Self {
            attempts: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn check_limit(&mut self, config: &RateLimitConfig) -> bool {
        let now = Instant::now();
        self.attempts
            .retain(|&attempt| now.duration_since(attempt) < config.window);
        self.last_seen = now;

        if self.attempts.len() >= config.max_attempts as usize {
            return false;
        }

        self.attempts.push(now);
        true
    }

    fn retry_after(&self, config: &RateLimitConfig) -> u64 {
        if let Some(&oldest) = self.attempts.first() {
            let elapsed = Instant::now().duration_since(oldest);
            config.window.saturating_sub(elapsed).as_secs()
        } else {
            0
        }
    }
}

pub struct RateLimiter {
    trackers: Arc<DashMap<String, AttemptTracker>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = config.window;
        let limiter = Self {
            trackers: Arc::new(DashMap::new()),
            config,
        };

        // Drop trackers with no recent activity so the map stays bounded.
        let trackers = limiter.trackers.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(300)).await;
                trackers.retain(|_, tracker| {
                    Instant::now().duration_since(tracker.last_seen) < window * 2
                });
            }
        });

        limiter
    }

    /// Ok when the attempt is admitted; Err carries the retry-after seconds.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut entry = self
            .trackers
            .entry(key.to_string())
            .or_insert_with(AttemptTracker::new);

        if entry.check_limit(&self.config) {
            Ok(())
        } else {
            Err(entry.retry_after(&self.config))
        }
    }
}

pub async fn login_rate_limit_middleware(
    Extension(limiter): Extension<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check(&addr.ip().to_string()) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!("Login rate limit exceeded for {}", addr.ip());
            let body = Json(json!({
                "error": SignInError::TooManyRequests.to_string(),
                "status": StatusCode::TOO_MANY_REQUESTS.as_u16(),
                "retryAfter": retry_after,
            }));
            (StatusCode::TOO_MANY_REQUESTS, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_the_limit_then_refuses() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 3,
            window: Duration::from_secs(60),
        });

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        assert!(limiter.check("10.0.0.1").is_err());
    }

    #[tokio::test]
    async fn clients_are_tracked_independently() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 1,
            window: Duration::from_secs(60),
        });

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[tokio::test]
    async fn window_expiry_readmits() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_attempts: 1,
            window: Duration::from_millis(20),
        });

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
        sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("10.0.0.1").is_ok());
    }
}
