//! Daily usage buckets and admission decisions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ClientAddress;

/// Retention window of a usage counter, re-armed on every increment.
pub const COUNTER_RETENTION_SECONDS: u64 = 24 * 60 * 60;

/// Identifier of one address's usage bucket on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterKey(String);

impl CounterKey {
    /// Builds the key for an address on a given UTC day.
    #[must_use]
    pub fn for_day(address: ClientAddress, day: NaiveDate) -> Self {
        Self(format!("{address}:{}", day.format("%Y-%m-%d")))
    }

    /// Builds the key for the UTC day containing `instant`.
    #[must_use]
    pub fn at(address: ClientAddress, instant: DateTime<Utc>) -> Self {
        Self::for_day(address, instant.date_naive())
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Why a request was admitted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionReason {
    /// The caller holds an active entitlement; counters are not consulted.
    Unmetered,
    /// The caller's address is below the daily limit.
    WithinQuota,
    /// The caller's address has used up the daily limit.
    QuotaExceeded,
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Reason for the decision.
    pub reason: AdmissionReason,
    /// Usage observed for the address today (0 when unmetered).
    pub used: u64,
    /// Configured daily limit.
    pub limit: u64,
}

impl Admission {
    /// Admission for an entitled caller.
    #[must_use]
    pub fn unmetered(limit: u64) -> Self {
        Self {
            allowed: true,
            reason: AdmissionReason::Unmetered,
            used: 0,
            limit,
        }
    }

    /// Admission decided by comparing usage against the daily limit.
    #[must_use]
    pub fn metered(used: u64, limit: u64) -> Self {
        let allowed = used < limit;
        Self {
            allowed,
            reason: if allowed {
                AdmissionReason::WithinQuota
            } else {
                AdmissionReason::QuotaExceeded
            },
            used,
            limit,
        }
    }

    /// Returns true when a successful request must be charged to the address.
    #[must_use]
    pub fn is_chargeable(&self) -> bool {
        self.allowed && self.reason == AdmissionReason::WithinQuota
    }
}

/// Remaining daily allowance for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remaining {
    /// Calls left today, never negative.
    pub remaining: u64,
    /// Configured daily limit.
    pub limit: u64,
}

impl Remaining {
    /// Computes the remaining allowance from observed usage.
    #[must_use]
    pub fn from_usage(used: u64, limit: u64) -> Self {
        Self {
            remaining: limit.saturating_sub(used),
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::{Admission, AdmissionReason, CounterKey, Remaining};
    use crate::ClientAddress;

    fn address(octets: [u8; 4]) -> ClientAddress {
        ClientAddress::from(std::net::IpAddr::from(octets))
    }

    #[test]
    fn counter_key_uses_address_and_iso_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let key = CounterKey::for_day(address([203, 0, 113, 7]), day);
        assert_eq!(key.as_str(), "203.0.113.7:2024-01-01");
    }

    #[test]
    fn metered_admission_denies_at_limit() {
        assert!(Admission::metered(2, 3).allowed);
        let denied = Admission::metered(3, 3);
        assert!(!denied.allowed);
        assert_eq!(denied.reason, AdmissionReason::QuotaExceeded);
        assert!(!denied.is_chargeable());
    }

    #[test]
    fn unmetered_admission_is_never_charged() {
        let admission = Admission::unmetered(3);
        assert!(admission.allowed);
        assert!(!admission.is_chargeable());
    }

    #[test]
    fn remaining_saturates_at_zero() {
        assert_eq!(Remaining::from_usage(7, 3).remaining, 0);
        assert_eq!(Remaining::from_usage(1, 3).remaining, 2);
    }

    proptest! {
        #[test]
        fn same_address_same_day_shares_a_key(octets in any::<[u8; 4]>(), ordinal in 1u32..365) {
            let day = NaiveDate::from_yo_opt(2024, ordinal).unwrap_or_default();
            prop_assert_eq!(
                CounterKey::for_day(address(octets), day),
                CounterKey::for_day(address(octets), day)
            );
        }

        #[test]
        fn next_day_never_reuses_a_key(octets in any::<[u8; 4]>(), ordinal in 1u32..365) {
            let day = NaiveDate::from_yo_opt(2024, ordinal).unwrap_or_default();
            let next = day.succ_opt().unwrap_or_default();
            prop_assert_ne!(
                CounterKey::for_day(address(octets), day),
                CounterKey::for_day(address(octets), next)
            );
        }
    }
}
