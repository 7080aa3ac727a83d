//! In-memory seat and lease stores for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use boxoffice_core::{Clock, LeaseStore, SeatChange, SeatFilter, SeatRepository, StoreResult};
use boxoffice_shared::{LeaseKey, Seat};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Seat table guarded by a single Tokio mutex.
///
/// Every repository call takes the lock once, which makes each conditional
/// update atomic with respect to every other call.
#[derive(Debug, Default)]
pub struct MemorySeatRepository {
    seats: Mutex<HashMap<Uuid, Seat>>,
}

impl MemorySeatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, seat: Seat) -> Uuid {
        let id = seat.id;
        self.seats.lock().await.insert(id, seat);
        id
    }

    /// Inserts seats `1..=count` of `event_id`, all available
    pub async fn seed(&self, event_id: &str, count: i32) -> Vec<Seat> {
        let mut seats = self.seats.lock().await;
        (1..=count)
            .map(|number| {
                let seat = Seat::new(event_id, number);
                seats.insert(seat.id, seat.clone());
                seat
            })
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<Seat> {
        self.seats.lock().await.get(&id).cloned()
    }

    pub async fn find_by_number(&self, event_id: &str, number: i32) -> Option<Seat> {
        self.seats
            .lock()
            .await
            .values()
            .find(|seat| seat.event_id == event_id && seat.number == number)
            .cloned()
    }
}

#[async_trait]
impl SeatRepository for MemorySeatRepository {
    async fn find_candidate(&self, filter: &SeatFilter) -> StoreResult<Option<Seat>> {
        let seats = self.seats.lock().await;
        Ok(seats
            .values()
            .filter(|seat| filter.matches(seat))
            .min_by(|a, b| (&a.event_id, a.number).cmp(&(&b.event_id, b.number)))
            .cloned())
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected_version: i64,
        change: &SeatChange,
    ) -> StoreResult<Option<Seat>> {
        let mut seats = self.seats.lock().await;
        match seats.get_mut(&id) {
            Some(seat) if seat.version == expected_version => {
                change.apply(seat);
                Ok(Some(seat.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn bulk_conditional_update(
        &self,
        filter: &SeatFilter,
        change: &SeatChange,
    ) -> StoreResult<u64> {
        let mut seats = self.seats.lock().await;
        let mut affected = 0;
        for seat in seats.values_mut().filter(|seat| filter.matches(seat)) {
            change.apply(seat);
            affected += 1;
        }
        Ok(affected)
    }
}

#[derive(Debug, Clone)]
struct MemoryLease {
    owner: String,
    expires_at: DateTime<Utc>,
}

/// Lease map whose entries lapse according to the injected clock
pub struct MemoryLeaseStore {
    leases: Mutex<HashMap<String, MemoryLease>>,
    clock: Arc<dyn Clock>,
}

impl MemoryLeaseStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Drops the entry for `key` if it has lapsed and returns the live one
    fn live<'a>(
        leases: &'a mut HashMap<String, MemoryLease>,
        key: &LeaseKey,
        now: DateTime<Utc>,
    ) -> Option<&'a MemoryLease> {
        if leases.get(key.as_str()).is_some_and(|lease| lease.expires_at <= now) {
            leases.remove(key.as_str());
        }
        leases.get(key.as_str())
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn acquire(&self, key: &LeaseKey, owner: &str, ttl_seconds: u64) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut leases = self.leases.lock().await;

        if Self::live(&mut leases, key, now).is_some() {
            return Ok(false);
        }

        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        leases.insert(
            key.as_str().to_string(),
            MemoryLease {
                owner: owner.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn read_owner(&self, key: &LeaseKey) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let mut leases = self.leases.lock().await;
        Ok(Self::live(&mut leases, key, now).map(|lease| lease.owner.clone()))
    }

    async fn release(&self, key: &LeaseKey) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut leases = self.leases.lock().await;
        let existed = Self::live(&mut leases, key, now).is_some();
        leases.remove(key.as_str());
        Ok(existed)
    }

    async fn ping(&self) -> bool {
        true
    }
}
