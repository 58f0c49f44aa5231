//! Search rate limiting against a real Redis instance

use std::time::Duration;

use buspass_server::{config::BookingConfig, error::AppError, services::rate_limit::RateLimiter};
use tokio_test::assert_ok;

async fn limiter(limit: u32, window_secs: u64) -> RateLimiter {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let config = BookingConfig {
        search_rate_limit: limit,
        search_window_secs: window_secs,
        ..Default::default()
    };
    RateLimiter::new(&url, &config)
        .await
        .expect("Failed to connect to Redis")
}

#[tokio::test]
#[ignore]
async fn test_rejected_searches_do_not_extend_the_window() {
    let limiter = limiter(2, 2).await;
    let scope = format!("test-{}", uuid::Uuid::new_v4().simple());

    assert_ok!(limiter.check(&scope, "198.51.100.30").await);
    assert_ok!(limiter.check(&scope, "198.51.100.30").await);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    for _ in 0..3 {
        let result = limiter.check(&scope, "198.51.100.30").await;
        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }

    // Only the two accepted hits count, and both have aged out by now
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_ok!(limiter.check(&scope, "198.51.100.30").await);
}

#[tokio::test]
#[ignore]
async fn test_clients_are_limited_independently() {
    let limiter = limiter(1, 60).await;
    let scope = format!("test-{}", uuid::Uuid::new_v4().simple());

    assert_ok!(limiter.check(&scope, "198.51.100.31").await);
    assert!(matches!(
        limiter.check(&scope, "198.51.100.31").await,
        Err(AppError::RateLimited(_))
    ));
    assert_ok!(limiter.check(&scope, "198.51.100.32").await);
}
