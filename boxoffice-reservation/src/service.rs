use std::sync::Arc;

use boxoffice_core::{Clock, LeaseStore, SeatRepository};
use boxoffice_shared::{Seat, StrategyKind};
use serde::Serialize;
use tracing::info;

use crate::error::{ReservationError, ReservationResult};
use crate::lease::LeaseStrategy;
use crate::occ::OptimisticStrategy;
use crate::retry::{retry_on_conflict, RetryPolicy};
use crate::strategy::{ReservationStrategy, StrategySelector};

#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub hold_seconds: u64,
    pub default_strategy: StrategyKind,
    pub retry: RetryPolicy,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            hold_seconds: 60,
            default_strategy: StrategyKind::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub strategy: StrategyKind,
    pub lease_store_alive: bool,
}

/// Hold / reserve / release entry point.
///
/// Reads the active strategy once per call and delegates to it; both
/// strategies share the same seat repository.
pub struct SeatReservationService {
    selector: StrategySelector,
    optimistic: Arc<dyn ReservationStrategy>,
    lease_based: Arc<dyn ReservationStrategy>,
    leases: Arc<dyn LeaseStore>,
    retry: RetryPolicy,
}

impl SeatReservationService {
    pub fn new(
        seats: Arc<dyn SeatRepository>,
        leases: Arc<dyn LeaseStore>,
        clock: Arc<dyn Clock>,
        settings: ReservationSettings,
    ) -> Self {
        let optimistic = Arc::new(OptimisticStrategy::new(
            seats.clone(),
            clock.clone(),
            settings.hold_seconds,
        ));
        let lease_based = Arc::new(LeaseStrategy::new(
            seats,
            leases.clone(),
            clock,
            settings.hold_seconds,
        ));

        Self {
            selector: StrategySelector::new(settings.default_strategy),
            optimistic,
            lease_based,
            leases,
            retry: settings.retry,
        }
    }

    fn strategy(&self) -> &Arc<dyn ReservationStrategy> {
        match self.selector.current() {
            StrategyKind::Optimistic => &self.optimistic,
            StrategyKind::LeaseBased => &self.lease_based,
        }
    }

    pub async fn hold(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        self.strategy().hold(event_id, seat_number, actor_id).await
    }

    pub async fn reserve(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        self.strategy().reserve(event_id, seat_number, actor_id).await
    }

    pub async fn release(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        self.strategy().release(event_id, seat_number, actor_id).await
    }

    /// `hold` with the configured bounded retry on conflict; each attempt re-reads the strategy
    pub async fn hold_with_retry(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        retry_on_conflict(&self.retry, || self.hold(event_id, seat_number, actor_id)).await
    }

    pub async fn reserve_with_retry(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        retry_on_conflict(&self.retry, || self.reserve(event_id, seat_number, actor_id)).await
    }

    pub async fn release_with_retry(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat> {
        retry_on_conflict(&self.retry, || self.release(event_id, seat_number, actor_id)).await
    }

    pub fn current_strategy(&self) -> StrategyKind {
        self.selector.current()
    }

    /// Switches strategy for subsequent calls; in-flight calls keep theirs
    pub fn set_strategy(&self, kind: StrategyKind) -> StrategyKind {
        let previous = self.selector.set(kind);
        if previous != kind {
            info!(from = %previous, to = %kind, "Reservation strategy changed");
        }
        previous
    }

    pub fn set_strategy_by_name(&self, name: &str) -> ReservationResult<StrategyKind> {
        let kind = name
            .parse::<StrategyKind>()
            .map_err(|_| ReservationError::UnknownStrategy(name.to_string()))?;
        self.set_strategy(kind);
        Ok(kind)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn lease_store_alive(&self) -> bool {
        self.leases.ping().await
    }

    pub async fn health(&self) -> HealthReport {
        let strategy = self.current_strategy();
        let lease_store_alive = self.lease_store_alive().await;
        let status = if strategy == StrategyKind::LeaseBased && !lease_store_alive {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };

        HealthReport {
            status,
            strategy,
            lease_store_alive,
        }
    }
}
