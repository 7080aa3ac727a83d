use std::sync::Arc;

use async_trait::async_trait;
use boxoffice_core::{Clock, LeaseStore, SeatChange, SeatFilter, SeatRepository};
use boxoffice_shared::{LeaseKey, Seat, SeatStatus, StrategyKind};
use tracing::{error, info, warn};

use crate::error::{ReservationError, ReservationResult};
use crate::occ::{compare_and_swap, hold_deadline};
use crate::strategy::ReservationStrategy;

/// Serializes holds through a set-if-absent lease before touching the seat row.
///
/// The lease TTL equals the hold duration; rows left `held` after a lease
/// lapses are returned to `available` by the expiry reclaimer.
pub struct LeaseStrategy {
    seats: Arc<dyn SeatRepository>,
    leases: Arc<dyn LeaseStore>,
    clock: Arc<dyn Clock>,
    hold_seconds: u64,
}

impl LeaseStrategy {
    pub fn new(
        seats: Arc<dyn SeatRepository>,
        leases: Arc<dyn LeaseStore>,
        clock: Arc<dyn Clock>,
        hold_seconds: u64,
    ) -> Self {
        Self {
            seats,
            leases,
            clock,
            hold_seconds,
        }
    }

    /// Gives the lease back after the row write failed
    async fn abandon_lease(&self, key: &LeaseKey) {
        if let Err(e) = self.leases.release(key).await {
            error!(lease = %key, error = %e, "Failed to abandon seat lease");
        }
    }
}

#[async_trait]
impl ReservationStrategy for LeaseStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LeaseBased
    }

    async fn hold(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let seat = self
            .seats
            .find_candidate(&SeatFilter::seat(event_id, seat_number).with_status(SeatStatus::Available))
            .await?
            .ok_or_else(|| ReservationError::NotFound("Seat not available".to_string()))?;

        let key = seat.lease_key();
        if !self.leases.acquire(&key, actor_id, self.hold_seconds).await? {
            warn!(event_id, seat_number, actor_id, "Seat lease already taken");
            return Err(ReservationError::Conflict("Seat is already held".to_string()));
        }

        // The lease only serializes overlapping holders; the version check
        // catches a stale availability read taken before an earlier holder reserved
        let held_until = hold_deadline(self.clock.now(), self.hold_seconds);
        let change = SeatChange::held(actor_id, held_until);
        let updated = match compare_and_swap(self.seats.as_ref(), &seat, &change).await {
            Ok(updated) => updated,
            Err(e) => {
                self.abandon_lease(&key).await;
                return Err(e);
            }
        };

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat held");
        Ok(updated)
    }

    async fn reserve(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let key = LeaseKey::new(event_id, seat_number);
        let owner = self.leases.read_owner(&key).await?;
        if owner.as_deref() != Some(actor_id) {
            return Err(ReservationError::NotFound("Seat is not held by this user".to_string()));
        }

        let filter = SeatFilter::seat(event_id, seat_number)
            .with_status(SeatStatus::Held)
            .held_by(actor_id)
            .held_until_after(self.clock.now());

        let seat = self.seats.find_candidate(&filter).await?.ok_or_else(|| {
            ReservationError::NotFound("Seat not found or not available for reservation".to_string())
        })?;

        let updated =
            compare_and_swap(self.seats.as_ref(), &seat, &SeatChange::reserved(actor_id)).await?;

        if !self.leases.release(&key).await? {
            warn!(event_id, seat_number, actor_id, "Hold lease lapsed before release");
            return Err(ReservationError::Conflict(
                "Hold lease could not be released".to_string(),
            ));
        }

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat reserved");
        Ok(updated)
    }

    async fn release(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let key = LeaseKey::new(event_id, seat_number);
        let owner = self.leases.read_owner(&key).await?;

        let filter = if owner.as_deref() == Some(actor_id) {
            if !self.leases.release(&key).await? {
                warn!(event_id, seat_number, actor_id, "Hold lease lapsed before release");
                return Err(ReservationError::Conflict(
                    "Hold lease could not be released".to_string(),
                ));
            }
            info!(event_id, seat_number, actor_id, "Hold lease released");

            SeatFilter::seat(event_id, seat_number)
                .with_status(SeatStatus::Held)
                .with_status(SeatStatus::Reserved)
                .held_by(actor_id)
        } else {
            // Without a lease only a confirmed reservation can still belong to the actor
            SeatFilter::seat(event_id, seat_number)
                .with_status(SeatStatus::Reserved)
                .held_by(actor_id)
        };

        let seat = self.seats.find_candidate(&filter).await?.ok_or_else(|| {
            ReservationError::NotFound("Seat not found or not reserved by the user".to_string())
        })?;

        let updated = compare_and_swap(self.seats.as_ref(), &seat, &SeatChange::available()).await?;

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat released");
        Ok(updated)
    }
}
