//! Redis read cache for public directory listings.
//!
//! Values are stored as JSON with a TTL. Every failure on the read path is
//! treated as a miss so a Redis outage only costs latency.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisCache {
    pub async fn new(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!(ttl_seconds, "Redis cache connected");

        Ok(Self {
            conn,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Fetch and decode a cached value. Errors and undecodable entries are misses.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let raw = match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Redis get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();
        let data = serde_json::to_string(value).context("Failed to encode cache value")?;

        conn.set_ex::<_, _, ()>(key, data, self.ttl.as_secs())
            .await
            .context("Failed to write cache value")?;

        debug!(key, ttl_secs = self.ttl.as_secs(), "Cached value");
        Ok(())
    }

    /// Drop every key matching a glob pattern.
    #[instrument(skip(self))]
    pub async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut matched: Vec<String> = Vec::new();

        // SCAN until the cursor wraps; KEYS would block the server
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await
                .context("Failed to scan cache keys")?;
            matched.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if matched.is_empty() {
            return Ok(0);
        }

        let deleted: usize = conn
            .del(&matched)
            .await
            .context("Failed to delete cache keys")?;

        debug!(pattern, deleted, "Invalidated cache keys");
        Ok(deleted)
    }

    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

/// Cache key layout.
pub mod keys {
    const DIRECTORY_PREFIX: &str = "craftsmen:directory";

    /// Public craftsman directory, optionally filtered by service.
    pub fn craftsman_directory(service: Option<&str>) -> String {
        match service {
            Some(service) => format!(
                "{}:service:{}",
                DIRECTORY_PREFIX,
                service.trim().to_lowercase()
            ),
            None => format!("{}:all", DIRECTORY_PREFIX),
        }
    }

    /// Every directory listing, used after approval or profile changes.
    pub fn directory_pattern() -> String {
        format!("{}:*", DIRECTORY_PREFIX)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn directory_keys_share_the_invalidation_prefix() {
            let all = craftsman_directory(None);
            let plumbing = craftsman_directory(Some(" Plumbing "));
            assert_eq!(all, "craftsmen:directory:all");
            assert_eq!(plumbing, "craftsmen:directory:service:plumbing");

            let prefix = directory_pattern();
            let prefix = prefix.trim_end_matches('*');
            assert!(all.starts_with(prefix));
            assert!(plumbing.starts_with(prefix));
        }
    }
}
