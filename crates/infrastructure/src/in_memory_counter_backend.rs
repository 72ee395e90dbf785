//! Process-local fallback tier for the daily usage counters.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use quotagate_application::CounterBackend;
use quotagate_core::AppResult;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    value: u64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Process-local counter adapter.
///
/// Serves as the fallback tier behind the durable backend. State lives only
/// as long as the process.
#[derive(Default)]
pub struct InMemoryCounterBackend {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl InMemoryCounterBackend {
    /// Creates an empty counter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterBackend for InMemoryCounterBackend {
    async fn get(&self, key: &str) -> AppResult<Option<u64>> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn increment_by(&self, key: &str, amount: u64) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if !entries.contains_key(key) {
            // A new bucket usually means a new day; drop the expired ones.
            entries.retain(|_, entry| !entry.is_expired(now));
        }
        let entry = entries.entry(key.to_owned()).or_insert(CounterEntry {
            value: 0,
            expires_at: None,
        });

        if entry.is_expired(now) {
            *entry = CounterEntry {
                value: 0,
                expires_at: None,
            };
        }

        entry.value = entry.value.saturating_add(amount);
        Ok(entry.value)
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            let now = Instant::now();
            entry.expires_at = Some(
                now.checked_add(Duration::from_secs(ttl_seconds))
                    .unwrap_or(now),
            );
        }

        Ok(())
    }
}
