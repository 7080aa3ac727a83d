use std::sync::Arc;

use async_trait::async_trait;
use boxoffice_core::{Clock, SeatChange, SeatFilter, SeatRepository};
use boxoffice_shared::{Seat, SeatStatus, StrategyKind};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::{ReservationError, ReservationResult};
use crate::strategy::ReservationStrategy;

/// Writes `change` only if the row still carries the version we read.
///
/// Shared by both strategies; a zero-row update is a lost race.
pub(crate) async fn compare_and_swap(
    seats: &dyn SeatRepository,
    seat: &Seat,
    change: &SeatChange,
) -> ReservationResult<Seat> {
    match seats.conditional_update(seat.id, seat.version, change).await? {
        Some(updated) => Ok(updated),
        None => {
            warn!(
                event_id = %seat.event_id,
                seat_number = seat.number,
                expected_version = seat.version,
                "Lost seat update race"
            );
            Err(ReservationError::Conflict(format!(
                "Seat {} was modified concurrently",
                seat.number
            )))
        }
    }
}

/// `now + hold_seconds`, saturating at the latest representable instant
pub(crate) fn hold_deadline(now: DateTime<Utc>, hold_seconds: u64) -> DateTime<Utc> {
    i64::try_from(hold_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|hold| now.checked_add_signed(hold))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Version-checked transitions with no auxiliary coordination service
pub struct OptimisticStrategy {
    seats: Arc<dyn SeatRepository>,
    clock: Arc<dyn Clock>,
    hold_seconds: u64,
}

impl OptimisticStrategy {
    pub fn new(seats: Arc<dyn SeatRepository>, clock: Arc<dyn Clock>, hold_seconds: u64) -> Self {
        Self {
            seats,
            clock,
            hold_seconds,
        }
    }
}

#[async_trait]
impl ReservationStrategy for OptimisticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Optimistic
    }

    async fn hold(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let seat = self
            .seats
            .find_candidate(&SeatFilter::seat(event_id, seat_number).with_status(SeatStatus::Available))
            .await?
            .ok_or_else(|| ReservationError::NotFound("Seat not available".to_string()))?;

        let held_until = hold_deadline(self.clock.now(), self.hold_seconds);
        let updated =
            compare_and_swap(self.seats.as_ref(), &seat, &SeatChange::held(actor_id, held_until)).await?;

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat held");
        Ok(updated)
    }

    async fn reserve(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let filter = SeatFilter::seat(event_id, seat_number)
            .with_status(SeatStatus::Held)
            .held_by(actor_id)
            .held_until_after(self.clock.now());

        let seat = self.seats.find_candidate(&filter).await?.ok_or_else(|| {
            ReservationError::NotFound("Seat not found or not available for reservation".to_string())
        })?;

        let updated =
            compare_and_swap(self.seats.as_ref(), &seat, &SeatChange::reserved(actor_id)).await?;

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat reserved");
        Ok(updated)
    }

    async fn release(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        let filter = SeatFilter::seat(event_id, seat_number)
            .with_status(SeatStatus::Held)
            .with_status(SeatStatus::Reserved)
            .held_by(actor_id);

        let seat = self.seats.find_candidate(&filter).await?.ok_or_else(|| {
            ReservationError::NotFound("Seat not found or not held/reserved by the user".to_string())
        })?;

        let updated = compare_and_swap(self.seats.as_ref(), &seat, &SeatChange::available()).await?;

        info!(event_id, seat_number, actor_id, version = updated.version, "Seat released");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::ManualClock;
    use boxoffice_store::MemorySeatRepository;

    async fn setup() -> (OptimisticStrategy, Arc<MemorySeatRepository>, Arc<ManualClock>) {
        let seats = Arc::new(MemorySeatRepository::new());
        seats.seed("E1", 3).await;
        let clock = Arc::new(ManualClock::default());
        let strategy = OptimisticStrategy::new(seats.clone(), clock.clone(), 60);
        (strategy, seats, clock)
    }

    #[tokio::test]
    async fn test_hold_sets_holder_expiry_and_version() {
        let (strategy, _seats, clock) = setup().await;

        let seat = strategy.hold("E1", 1, "A").await.unwrap();
        assert_eq!(seat.status, SeatStatus::Held);
        assert_eq!(seat.held_by.as_deref(), Some("A"));
        assert_eq!(seat.held_until, Some(clock.now() + Duration::seconds(60)));
        assert_eq!(seat.version, 1);
    }

    #[tokio::test]
    async fn test_hold_of_taken_or_unknown_seat_is_not_found() {
        let (strategy, _seats, _clock) = setup().await;
        strategy.hold("E1", 1, "A").await.unwrap();

        assert!(matches!(strategy.hold("E1", 1, "B").await, Err(ReservationError::NotFound(_))));
        assert!(matches!(strategy.hold("E1", 99, "B").await, Err(ReservationError::NotFound(_))));
        assert!(matches!(strategy.hold("E2", 1, "B").await, Err(ReservationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reserve_requires_live_hold_by_same_actor() {
        let (strategy, _seats, clock) = setup().await;

        // available -> reserved is never allowed
        assert!(matches!(strategy.reserve("E1", 1, "A").await, Err(ReservationError::NotFound(_))));

        strategy.hold("E1", 1, "A").await.unwrap();
        assert!(matches!(strategy.reserve("E1", 1, "B").await, Err(ReservationError::NotFound(_))));

        clock.advance(Duration::seconds(61));
        assert!(matches!(strategy.reserve("E1", 1, "A").await, Err(ReservationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_release_of_held_and_reserved_seats() {
        let (strategy, _seats, _clock) = setup().await;

        strategy.hold("E1", 1, "A").await.unwrap();
        let released = strategy.release("E1", 1, "A").await.unwrap();
        assert_eq!(released.status, SeatStatus::Available);
        assert_eq!(released.version, 2);
        assert!(released.held_by.is_none() && released.held_until.is_none());

        strategy.hold("E1", 2, "A").await.unwrap();
        strategy.reserve("E1", 2, "A").await.unwrap();
        assert!(matches!(strategy.release("E1", 2, "B").await, Err(ReservationError::NotFound(_))));
        assert_eq!(strategy.release("E1", 2, "A").await.unwrap().version, 3);
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let (_strategy, seats, _clock) = setup().await;
        let stale = seats.find_by_number("E1", 1).await.unwrap();

        seats
            .conditional_update(stale.id, stale.version, &SeatChange::held("A", chrono::Utc::now()))
            .await
            .unwrap();

        let result = compare_and_swap(seats.as_ref(), &stale, &SeatChange::held("B", chrono::Utc::now())).await;
        assert!(matches!(result, Err(ReservationError::Conflict(_))));
        assert_eq!(seats.get(stale.id).await.unwrap().held_by.as_deref(), Some("A"));
    }

    #[test]
    fn test_hold_deadline_saturates() {
        let now = Utc::now();
        assert_eq!(hold_deadline(now, 60), now + Duration::seconds(60));
        assert_eq!(hold_deadline(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(hold_deadline(now, i64::MAX as u64), DateTime::<Utc>::MAX_UTC);
    }

    #[tokio::test]
    async fn test_hold_with_huge_duration_does_not_panic() {
        let seats = Arc::new(MemorySeatRepository::new());
        seats.seed("E1", 1).await;
        let strategy = OptimisticStrategy::new(seats, Arc::new(ManualClock::default()), u64::MAX);

        let seat = strategy.hold("E1", 1, "A").await.unwrap();
        assert_eq!(seat.held_until, Some(DateTime::<Utc>::MAX_UTC));
    }
}
