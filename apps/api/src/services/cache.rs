//! Recommendation response cache
//!
//! Redis-backed cache between the pipeline and the push path. The cache is
//! strictly an accelerator: read failures degrade to a miss, write failures
//! are dropped, and both are logged rather than surfaced.

use std::time::Duration;

use crate::deadline::Deadline;
use crate::models::ListeningContext;

use super::pipeline::RecommendationResponse;

/// Budget for best-effort cache writes and invalidations, which may run
/// outside any request deadline.
const CACHE_WRITE_BUDGET: Duration = Duration::from_secs(2);

/// SCAN page size for prefix invalidation
const SCAN_PAGE_SIZE: usize = 100;

/// Build the cache key for a (user, context) pair.
///
/// The context fragment is canonical, so a missing context and an empty
/// context produce the same key.
pub fn cache_key(user_id: &str, context: &ListeningContext) -> String {
    format!("recommendations:{}:{}", user_id, context.cache_fragment())
}

/// Key prefix owned by a single user, for invalidation.
pub fn user_key_prefix(user_id: &str) -> String {
    format!("recommendations:{}:", user_id)
}

/// Redis-backed recommendation cache
#[derive(Clone)]
pub struct RecommendationCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RecommendationCache {
    /// Create a new cache over an existing Redis client
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    /// Look up a cached response. Any failure (connection, timeout,
    /// deserialization) is a miss.
    pub async fn get(&self, key: &str, deadline: Deadline) -> Option<RecommendationResponse> {
        let result = tokio::time::timeout(deadline.remaining(), self.fetch(key)).await;
        match result {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
            Err(_) => {
                tracing::warn!(key = %key, "Cache read timed out, treating as miss");
                None
            }
        }
    }

    /// Store a response under `key` with the configured TTL. Failures are
    /// dropped.
    pub async fn put(&self, key: &str, response: &RecommendationResponse) {
        let payload = match serde_json::to_string(response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to serialize cached response");
                return;
            }
        };

        let result = tokio::time::timeout(CACHE_WRITE_BUDGET, self.store(key, payload)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, key = %key, "Cache write failed, dropping entry");
            }
            Err(_) => {
                tracing::warn!(key = %key, "Cache write timed out, dropping entry");
            }
        }
    }

    /// Remove every cache entry belonging to `user_id`.
    ///
    /// Uses a cursor SCAN over the user's key prefix. Failures are logged;
    /// a failed invalidation only means the stale entries age out by TTL.
    pub async fn invalidate_user(&self, user_id: &str) {
        let pattern = format!("{}*", user_key_prefix(user_id));
        let result = tokio::time::timeout(CACHE_WRITE_BUDGET, self.delete_matching(&pattern)).await;
        match result {
            Ok(Ok(deleted)) => {
                tracing::debug!(user_id = %user_id, deleted = deleted, "Cache invalidated");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, user_id = %user_id, "Cache invalidation failed");
            }
            Err(_) => {
                tracing::warn!(user_id = %user_id, "Cache invalidation timed out");
            }
        }
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<RecommendationResponse>, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(payload.and_then(|json| match serde_json::from_str(&json) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Malformed cache entry, treating as miss");
                None
            }
        }))
    }

    async fn store(&self, key: &str, payload: String) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(payload)
            .query_async(&mut conn)
            .await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut cursor: u64 = 0;
        let mut deleted = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_PAGE_SIZE)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                deleted += keys.len();
                redis::cmd("DEL").arg(&keys).query_async::<_, ()>(&mut conn).await?;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(deleted)
    }
}
