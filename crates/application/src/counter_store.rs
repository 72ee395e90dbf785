//! Daily usage counters with a durable tier and a process-local fallback.
//!
//! The durable tier is shared by every instance; the local tier only keeps
//! the service usable while the durable backend is unreachable. The two are
//! never reconciled, so an outage can undercount usage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use quotagate_core::AppResult;
use quotagate_domain::{COUNTER_RETENTION_SECONDS, CounterKey};


/// Storage port for integer counters.
#[async_trait]
pub trait CounterBackend: Send + Sync {
    /// Reads a counter, `None` when it does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<u64>>;

    /// Atomically adds `amount` and returns the new value.
    async fn increment_by(&self, key: &str, amount: u64) -> AppResult<u64>;

    /// Sets the counter to expire `ttl_seconds` from now.
    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<()>;
}

/// Usage counter service chaining the durable tier to the local fallback.
#[derive(Clone)]
pub struct CounterStore {
    durable: Option<Arc<dyn CounterBackend>>,
    local: Arc<dyn CounterBackend>,
}

impl CounterStore {
    /// Creates a store. Without a durable backend every call goes to `local`.
    #[must_use]
    pub fn new(durable: Option<Arc<dyn CounterBackend>>, local: Arc<dyn CounterBackend>) -> Self {
        Self { durable, local }
    }

    /// Returns true when a durable backend is configured.
    #[must_use]
    pub fn has_durable_tier(&self) -> bool {
        self.durable.is_some()
    }

    /// Returns the current count for a key, 0 when absent.
    ///
    /// Never fails: a durable-tier error falls through to the local tier, and
    /// a local-tier error reads as 0.
    pub async fn get(&self, key: &CounterKey) -> u64 {
        if let Some(durable) = &self.durable {
            match durable.get(key.as_str()).await {
                Ok(value) => return value.unwrap_or(0),
                Err(error) => {
                    warn!(key = %key, error = %error, "durable counter read failed, using local fallback");
                }
            }
        }

        match self.local.get(key.as_str()).await {
            Ok(value) => value.unwrap_or(0),
            Err(error) => {
                warn!(key = %key, error = %error, "local counter read failed");
                0
            }
        }
    }

    /// Records one unit of usage and re-arms the 24 hour retention window.
    pub async fn increment(&self, key: &CounterKey) {
        if let Some(durable) = &self.durable {
            match durable.increment_by(key.as_str(), 1).await {
                Ok(count) => {
                    // The increment already landed; falling back now would double count.
                    if let Err(error) = durable
                        .set_expiry(key.as_str(), COUNTER_RETENTION_SECONDS)
                        .await
                    {
                        warn!(key = %key, error = %error, "failed to refresh durable counter ttl");
                    }
                    debug!(key = %key, count, "durable counter incremented");
                    return;
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "durable counter increment failed, using local fallback");
                }
            }
        }

        match self.local.increment_by(key.as_str(), 1).await {
            Ok(count) => {
                if let Err(error) = self
                    .local
                    .set_expiry(key.as_str(), COUNTER_RETENTION_SECONDS)
                    .await
                {
                    warn!(key = %key, error = %error, "failed to refresh local counter ttl");
                }
                debug!(key = %key, count, "local counter incremented");
            }
            Err(error) => warn!(key = %key, error = %error, "local counter increment failed"),
        }
    }
}
