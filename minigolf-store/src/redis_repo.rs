use redis::{AsyncCommands, RedisResult};
use tracing::info;

/// Shared counters for the public rate limiter. Booking state never lives here.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        info!("Redis client configured");
        Ok(Self { client })
    }

    /// Fixed-window counter: true while `key` has been hit at most `limit`
    /// times in the current window. The window starts at the first hit and
    /// is not extended by later ones.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        if window_needs_expiry(ttl) {
            let _: () = conn.expire(key, window_seconds).await?;
        }

        Ok(count <= limit)
    }
}

/// A counter without a TTL was just created (or lost its expiry) and must be
/// given one. Any positive TTL belongs to a window that is still running.
fn window_needs_expiry(ttl: i64) -> bool {
    ttl < 0
}

/// Redis key for a client's request counter.
pub fn rate_limit_key(client: &str) -> String {
    format!("ratelimit:{}", client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_key_is_namespaced() {
        assert_eq!(rate_limit_key("203.0.113.7"), "ratelimit:203.0.113.7");
    }

    #[test]
    fn test_only_fresh_counters_get_an_expiry() {
        // -1: key exists without a TTL, -2: key missing.
        assert!(window_needs_expiry(-1));
        assert!(window_needs_expiry(-2));
        assert!(!window_needs_expiry(1));
        assert!(!window_needs_expiry(60));
    }

    #[tokio::test]
    async fn test_client_rejects_malformed_url() {
        assert!(RedisClient::new("not a url").await.is_err());
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn test_window_resets_even_while_client_keeps_polling() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let client = RedisClient::new(&url).await.unwrap();
        let key = rate_limit_key(&format!("test-{}", uuid::Uuid::new_v4()));

        assert!(client.check_rate_limit(&key, 2, 2).await.unwrap());
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(client.check_rate_limit(&key, 2, 2).await.unwrap());
        assert!(!client.check_rate_limit(&key, 2, 2).await.unwrap());

        // The hits above must not have pushed the window out.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(client.check_rate_limit(&key, 2, 2).await.unwrap());
    }
}
