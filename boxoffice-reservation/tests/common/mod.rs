#![allow(dead_code)]

use std::sync::Arc;

use boxoffice_core::ManualClock;
use boxoffice_reservation::{ReservationSettings, RetryPolicy, SeatReservationService};
use boxoffice_shared::StrategyKind;
use boxoffice_store::{MemoryLeaseStore, MemorySeatRepository};

pub const EVENT: &str = "E1";

pub struct Harness {
    pub service: Arc<SeatReservationService>,
    pub seats: Arc<MemorySeatRepository>,
    pub leases: Arc<MemoryLeaseStore>,
    pub clock: Arc<ManualClock>,
}

/// Memory-backed service with seats `1..=seat_count` of [`EVENT`], all available
pub async fn harness(strategy: StrategyKind, seat_count: i32) -> Harness {
    let clock = Arc::new(ManualClock::default());
    let seats = Arc::new(MemorySeatRepository::new());
    seats.seed(EVENT, seat_count).await;
    let leases = Arc::new(MemoryLeaseStore::new(clock.clone()));

    let settings = ReservationSettings {
        hold_seconds: 60,
        default_strategy: strategy,
        retry: RetryPolicy::no_retry(),
    };
    let service = Arc::new(SeatReservationService::new(
        seats.clone(),
        leases.clone(),
        clock.clone(),
        settings,
    ));

    Harness {
        service,
        seats,
        leases,
        clock,
    }
}

pub const BOTH: [StrategyKind; 2] = [StrategyKind::Optimistic, StrategyKind::LeaseBased];
