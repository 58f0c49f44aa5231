//! Redis sliding-window rate limiter for public booking searches

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, Client, Script};

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
};

/// Trim the window, count it, and record the hit only while under the limit.
///
/// KEYS[1] window key; ARGV: window start, limit, now (ms), member, ttl (ms).
/// Returns the count seen before this hit.
static SLIDING_WINDOW: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        redis.call('ZREMRANGEBYSCORE', KEYS[1], 0, ARGV[1])
        local count = redis.call('ZCARD', KEYS[1])
        if count >= tonumber(ARGV[2]) then
            return count
        end
        redis.call('ZADD', KEYS[1], ARGV[3], ARGV[4])
        redis.call('PEXPIRE', KEYS[1], ARGV[5])
        return count
        "#,
    )
});

#[derive(Clone)]
pub struct RateLimiter {
    conn: ConnectionManager,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Connect to Redis and check the connection
    pub async fn new(url: &str, config: &BookingConfig) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            conn,
            limit: config.search_rate_limit,
            window: Duration::from_secs(config.search_window_secs.max(1)),
        })
    }

    fn key(scope: &str, client: &str) -> String {
        format!("rate_limit:{}:{}", scope, client)
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    /// Reject `client` when its window is full, otherwise record the hit.
    ///
    /// Rejected calls leave the window untouched, so a client that keeps
    /// retrying is let back in once its accepted hits age out. A Redis failure
    /// rejects the request as well.
    pub async fn check(&self, scope: &str, client: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = Self::key(scope, client);
        let now_ms = Self::now_ms();
        let window_ms = self.window.as_millis() as u64;
        let window_start = now_ms.saturating_sub(window_ms);
        // Two hits in the same millisecond must stay distinct members
        let member = format!("{}-{}", now_ms, uuid::Uuid::new_v4().simple());

        let count: u64 = SLIDING_WINDOW
            .key(&key)
            .arg(window_start)
            .arg(self.limit)
            .arg(now_ms)
            .arg(member)
            .arg(window_ms + 1_000)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, client = %client, "rate limiter unavailable, denying request");
                AppError::RateLimited("Too many requests, please try again later".to_string())
            })?;

        if count >= u64::from(self.limit) {
            tracing::warn!(client = %client, scope = %scope, count, "rate limit exceeded");
            return Err(AppError::RateLimited(
                "Too many search requests, please try again in a minute".to_string(),
            ));
        }
        Ok(())
    }
}
