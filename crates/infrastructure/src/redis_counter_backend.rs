//! Redis-backed usage counters.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use quotagate_application::CounterBackend;
use quotagate_core::{AppError, AppResult};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;

/// Redis implementation of the counter backend port.
///
/// Every call, including the first connection attempt, is bounded by
/// `timeout`; an elapsed timeout surfaces as [`AppError::Unavailable`].
#[derive(Clone)]
pub struct RedisCounterBackend {
    client: redis::Client,
    connection: std::sync::Arc<OnceCell<ConnectionManager>>,
    key_prefix: String,
    timeout: Duration,
}

impl RedisCounterBackend {
    /// Creates a backend with a configured Redis client, key prefix, and per-call timeout.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            connection: std::sync::Arc::new(OnceCell::new()),
            key_prefix: key_prefix.into(),
            timeout,
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        self.connection
            .get_or_try_init(|| async {
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|error| {
                        AppError::Unavailable(format!("failed to connect to redis: {error}"))
                    })
            })
            .await
            .cloned()
    }

    async fn bounded<T, F>(&self, operation: &str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| {
                AppError::Unavailable(format!(
                    "redis {operation} timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl CounterBackend for RedisCounterBackend {
    async fn get(&self, key: &str) -> AppResult<Option<u64>> {
        let redis_key = self.key_for(key);
        self.bounded("GET", async {
            let mut connection = self.connection().await?;
            connection
                .get::<_, Option<u64>>(redis_key)
                .await
                .map_err(|error| AppError::Unavailable(format!("failed to read usage counter: {error}")))
        })
        .await
    }

    async fn increment_by(&self, key: &str, amount: u64) -> AppResult<u64> {
        let redis_key = self.key_for(key);
        self.bounded("INCRBY", async {
            let mut connection = self.connection().await?;
            connection
                .incr::<_, _, u64>(redis_key, amount)
                .await
                .map_err(|error| {
                    AppError::Unavailable(format!("failed to increment usage counter: {error}"))
                })
        })
        .await
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<()> {
        let redis_key = self.key_for(key);
        let ttl = i64::try_from(ttl_seconds)
            .map_err(|error| AppError::Validation(format!("invalid counter ttl: {error}")))?;

        self.bounded("EXPIRE", async {
            let mut connection = self.connection().await?;
            connection
                .expire::<_, ()>(redis_key, ttl)
                .await
                .map_err(|error| {
                    AppError::Unavailable(format!("failed to set usage counter ttl: {error}"))
                })
        })
        .await
    }
}
