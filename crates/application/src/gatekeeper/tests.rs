use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quotagate_core::{AppError, AppResult};
use quotagate_domain::{
    AdmissionReason, ClientAddress, CounterKey, Identity, ProfileEntitlement, UserId,
};

use super::Gatekeeper;
use crate::{
    Clock, CounterBackend, CounterStore, EntitlementResolver, ProfileRepository, ProfileUpdate,
};

const PRO_USER: &str = "0b7c8f0e-3d4a-4c55-9e1f-2a6b7c8d9e01";
const FREE_USER: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

struct SteppingClock(Mutex<DateTime<Utc>>);

impl SteppingClock {
    fn at(year: i32, month: u32, day: u32) -> Self {
        Self(Mutex::new(instant(year, month, day)))
    }

    fn set(&self, value: DateTime<Utc>) {
        if let Ok(mut now) = self.0.lock() {
            *now = value;
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.lock().map(|now| *now).unwrap_or_default()
    }
}

fn instant(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Default)]
struct MemoryCounters(Mutex<HashMap<String, u64>>);

#[async_trait]
impl CounterBackend for MemoryCounters {
    async fn get(&self, key: &str) -> AppResult<Option<u64>> {
        Ok(self
            .0
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock counters: {error}")))?
            .get(key)
            .copied())
    }

    async fn increment_by(&self, key: &str, amount: u64) -> AppResult<u64> {
        let mut values = self
            .0
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock counters: {error}")))?;
        let entry = values.entry(key.to_owned()).or_insert(0);
        *entry += amount;
        Ok(*entry)
    }

    async fn set_expiry(&self, _key: &str, _ttl_seconds: u64) -> AppResult<()> {
        Ok(())
    }
}

struct ProOnly;

#[async_trait]
impl ProfileRepository for ProOnly {
    async fn find_entitlement(&self, user_id: UserId) -> AppResult<Option<ProfileEntitlement>> {
        Ok(Some(ProfileEntitlement {
            is_pro: user_id.to_string() == PRO_USER,
            pro_expires_at: None,
        }))
    }

    async fn update_profile(&self, _user_id: UserId, _update: ProfileUpdate) -> AppResult<()> {
        Ok(())
    }
}

struct Harness {
    gatekeeper: Gatekeeper,
    clock: Arc<SteppingClock>,
}

fn harness(limit: u64) -> Harness {
    let clock = Arc::new(SteppingClock::at(2024, 1, 1));
    let counters = CounterStore::new(
        Some(Arc::new(MemoryCounters::default())),
        Arc::new(MemoryCounters::default()),
    );
    let entitlements = EntitlementResolver::new(Arc::new(ProOnly), clock.clone());
    Harness {
        gatekeeper: Gatekeeper::new(counters, entitlements, clock.clone(), limit),
        clock,
    }
}

fn address() -> ClientAddress {
    ClientAddress::from(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)))
}

fn identity(user: Option<&str>) -> Identity {
    Identity::new(address(), user.and_then(|value| UserId::parse(value).ok()))
}

async fn admit_and_commit(gatekeeper: &Gatekeeper, identity: &Identity) -> bool {
    let admission = gatekeeper.admit(identity).await;
    if admission.allowed {
        gatekeeper.commit(identity, &admission).await;
    }
    admission.allowed
}

#[tokio::test]
async fn quota_exhausts_on_limit_and_resets_next_utc_day() {
    let Harness { gatekeeper, clock } = harness(3);
    let caller = identity(None);

    for _ in 0..3 {
        assert!(admit_and_commit(&gatekeeper, &caller).await);
    }

    let denied = gatekeeper.admit(&caller).await;
    assert!(!denied.allowed);
    assert_eq!(denied.reason, AdmissionReason::QuotaExceeded);
    assert_eq!(denied.used, 3);

    clock.set(instant(2024, 1, 2));
    let next_day = gatekeeper.admit(&caller).await;
    assert!(next_day.allowed);
    assert_eq!(next_day.used, 0);
    assert_eq!(gatekeeper.remaining_for_address(address()).await.remaining, 3);
}

#[tokio::test]
async fn remaining_tracks_commits_not_admits() {
    let Harness { gatekeeper, .. } = harness(5);
    let caller = identity(None);

    for _ in 0..10 {
        let _ = gatekeeper.admit(&caller).await;
    }
    assert_eq!(gatekeeper.remaining_for_address(address()).await.remaining, 5);

    for commits in 1..=7_u64 {
        let admission = gatekeeper.admit(&caller).await;
        gatekeeper.commit(&caller, &admission).await;
        let remaining = gatekeeper.remaining_for_address(address()).await;
        assert_eq!(remaining.remaining, 5_u64.saturating_sub(commits.min(5)));
        assert_eq!(remaining.limit, 5);
    }
}

#[tokio::test]
async fn denied_admission_is_never_charged() {
    let Harness { gatekeeper, .. } = harness(1);
    let caller = identity(None);

    assert!(admit_and_commit(&gatekeeper, &caller).await);
    let denied = gatekeeper.admit(&caller).await;
    gatekeeper.commit(&caller, &denied).await;

    let key = CounterKey::at(address(), instant(2024, 1, 1));
    assert_eq!(gatekeeper.counters().get(&key).await, 1);
}

#[tokio::test]
async fn pro_caller_bypasses_quota_and_is_not_recorded() {
    let Harness { gatekeeper, .. } = harness(2);
    let anonymous = identity(None);
    let pro = identity(Some(PRO_USER));

    assert!(admit_and_commit(&gatekeeper, &anonymous).await);
    assert!(admit_and_commit(&gatekeeper, &anonymous).await);
    assert!(!gatekeeper.admit(&anonymous).await.allowed);

    for _ in 0..5 {
        let admission = gatekeeper.admit(&pro).await;
        assert!(admission.allowed);
        assert_eq!(admission.reason, AdmissionReason::Unmetered);
        gatekeeper.commit(&pro, &admission).await;
    }

    let remaining = gatekeeper.remaining_for_address(address()).await;
    assert_eq!(remaining.remaining, 0);
    let key = CounterKey::at(address(), instant(2024, 1, 1));
    assert_eq!(gatekeeper.counters().get(&key).await, 2);
}

#[tokio::test]
async fn free_user_id_is_metered_by_address() {
    let Harness { gatekeeper, .. } = harness(1);
    let free = identity(Some(FREE_USER));

    assert!(admit_and_commit(&gatekeeper, &free).await);
    let denied = gatekeeper.admit(&free).await;
    assert!(!denied.allowed);
    assert!(!gatekeeper.admit(&identity(None)).await.allowed);
}
