//! Per-request admission decisions over entitlements and daily quotas.
//!
//! `admit` only reads. Usage is charged by `commit`, which the caller invokes
//! after the gated work succeeded. The pair is not transactional: concurrent
//! requests from one address may overshoot the limit by the number in flight.

use std::sync::Arc;

use tracing::{debug, info};

use quotagate_domain::{Admission, ClientAddress, CounterKey, Identity, Remaining};

use crate::{Clock, CounterStore, EntitlementResolver};

#[cfg(test)]
mod tests;

/// Admission service composing usage counters and entitlements.
#[derive(Clone)]
pub struct Gatekeeper {
    counters: CounterStore,
    entitlements: EntitlementResolver,
    clock: Arc<dyn Clock>,
    daily_limit: u64,
}

impl Gatekeeper {
    /// Creates a gatekeeper enforcing `daily_limit` metered calls per address.
    #[must_use]
    pub fn new(
        counters: CounterStore,
        entitlements: EntitlementResolver,
        clock: Arc<dyn Clock>,
        daily_limit: u64,
    ) -> Self {
        Self {
            counters,
            entitlements,
            clock,
            daily_limit,
        }
    }

    /// Returns the configured daily limit.
    #[must_use]
    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    /// Returns the usage counters backing this gate.
    #[must_use]
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    /// Decides whether the identity may run the gated operation now.
    pub async fn admit(&self, identity: &Identity) -> Admission {
        if identity.user_id().is_some()
            && self.entitlements.is_unmetered(identity.user_id()).await
        {
            debug!(address = %identity.address(), "admitted unmetered caller");
            return Admission::unmetered(self.daily_limit);
        }

        let key = self.today_key(identity.address());
        let used = self.counters.get(&key).await;
        let admission = Admission::metered(used, self.daily_limit);

        if !admission.allowed {
            info!(
                address = %identity.address(),
                used,
                limit = self.daily_limit,
                "daily quota exhausted"
            );
        }

        admission
    }

    /// Charges one unit of usage after the gated operation succeeded.
    ///
    /// Denied and unmetered admissions are never charged.
    pub async fn commit(&self, identity: &Identity, admission: &Admission) {
        if !admission.is_chargeable() {
            return;
        }

        let key = self.today_key(identity.address());
        self.counters.increment(&key).await;
    }

    /// Reports the address's remaining allowance, ignoring entitlements.
    pub async fn remaining_for_address(&self, address: ClientAddress) -> Remaining {
        let used = self.counters.get(&self.today_key(address)).await;
        Remaining::from_usage(used, self.daily_limit)
    }

    fn today_key(&self, address: ClientAddress) -> CounterKey {
        CounterKey::at(address, self.clock.now())
    }
}
