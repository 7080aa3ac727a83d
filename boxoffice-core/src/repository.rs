use async_trait::async_trait;
use boxoffice_shared::{LeaseKey, Seat, SeatStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::StoreResult;

/// Row predicate understood by every seat repository.
///
/// Unset fields do not constrain the match; an empty `statuses` list
/// accepts any status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatFilter {
    pub event_id: Option<String>,
    pub number: Option<i32>,
    pub statuses: Vec<SeatStatus>,
    pub held_by: Option<String>,
    pub held_until_after: Option<DateTime<Utc>>,
    pub held_until_before: Option<DateTime<Utc>>,
}

impl SeatFilter {
    /// Matches one seat by its `(event_id, number)` identity
    pub fn seat(event_id: &str, number: i32) -> Self {
        Self {
            event_id: Some(event_id.to_string()),
            number: Some(number),
            ..Self::default()
        }
    }

    /// Every hold whose expiry lies strictly before `now`
    pub fn expired_holds(now: DateTime<Utc>) -> Self {
        Self::default()
            .with_status(SeatStatus::Held)
            .held_until_before(now)
    }

    pub fn with_status(mut self, status: SeatStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn held_by(mut self, actor_id: &str) -> Self {
        self.held_by = Some(actor_id.to_string());
        self
    }

    pub fn held_until_after(mut self, instant: DateTime<Utc>) -> Self {
        self.held_until_after = Some(instant);
        self
    }

    pub fn held_until_before(mut self, instant: DateTime<Utc>) -> Self {
        self.held_until_before = Some(instant);
        self
    }

    pub fn matches(&self, seat: &Seat) -> bool {
        if let Some(event_id) = &self.event_id {
            if &seat.event_id != event_id {
                return false;
            }
        }
        if let Some(number) = self.number {
            if seat.number != number {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&seat.status) {
            return false;
        }
        if let Some(actor_id) = &self.held_by {
            if seat.held_by.as_ref() != Some(actor_id) {
                return false;
            }
        }
        if let Some(after) = self.held_until_after {
            if !seat.held_until.map_or(false, |until| until > after) {
                return false;
            }
        }
        if let Some(before) = self.held_until_before {
            if !seat.held_until.map_or(false, |until| until < before) {
                return false;
            }
        }
        true
    }
}

/// Complete set of lifecycle fields written by a transition.
///
/// The version bump is implied and performed by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatChange {
    pub status: SeatStatus,
    pub held_by: Option<String>,
    pub held_until: Option<DateTime<Utc>>,
}

impl SeatChange {
    pub fn available() -> Self {
        Self {
            status: SeatStatus::Available,
            held_by: None,
            held_until: None,
        }
    }

    pub fn held(actor_id: &str, until: DateTime<Utc>) -> Self {
        Self {
            status: SeatStatus::Held,
            held_by: Some(actor_id.to_string()),
            held_until: Some(until),
        }
    }

    pub fn reserved(actor_id: &str) -> Self {
        Self {
            status: SeatStatus::Reserved,
            held_by: Some(actor_id.to_string()),
            held_until: None,
        }
    }

    /// Writes the change onto `seat` and bumps its version
    pub fn apply(&self, seat: &mut Seat) {
        seat.status = self.status;
        seat.held_by = self.held_by.clone();
        seat.held_until = self.held_until;
        seat.version += 1;
    }
}

/// Conditional-update table holding seat rows
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// First seat matching `filter`, if any
    async fn find_candidate(&self, filter: &SeatFilter) -> StoreResult<Option<Seat>>;

    /// Applies `change` only if the row still carries `expected_version`.
    ///
    /// `Ok(None)` means zero rows were affected.
    async fn conditional_update(
        &self,
        id: Uuid,
        expected_version: i64,
        change: &SeatChange,
    ) -> StoreResult<Option<Seat>>;

    /// Applies `change` to every row matching `filter` in one atomic statement
    async fn bulk_conditional_update(
        &self,
        filter: &SeatFilter,
        change: &SeatChange,
    ) -> StoreResult<u64>;
}

/// Key-value store with atomic set-if-absent and expiry
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Sets `key -> owner` with a TTL only when the key is absent
    async fn acquire(&self, key: &LeaseKey, owner: &str, ttl_seconds: u64) -> StoreResult<bool>;

    async fn read_owner(&self, key: &LeaseKey) -> StoreResult<Option<String>>;

    /// Deletes the key; `Ok(false)` when it was already gone
    async fn release(&self, key: &LeaseKey) -> StoreResult<bool>;

    /// Liveness probe, never errors
    async fn ping(&self) -> bool;
}
