use std::sync::Arc;
use std::time::{Duration, Instant};

use boxoffice_shared::StrategyKind;
use serde::Serialize;
use tracing::{info, warn};

use crate::service::SeatReservationService;

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub strategy: StrategyKind,
    pub iterations: u32,
    pub succeeded: u32,
    pub failed: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Drives hold, reserve and release cycles through the service under a given strategy
pub struct BenchmarkRunner {
    service: Arc<SeatReservationService>,
}

impl BenchmarkRunner {
    pub fn new(service: Arc<SeatReservationService>) -> Self {
        Self { service }
    }

    /// Iteration `i` cycles seat `(i % seat_count) + 1` as actor `user{i}`.
    ///
    /// The active strategy is switched for the run and restored afterwards.
    pub async fn run(
        &self,
        strategy: StrategyKind,
        event_id: &str,
        seat_count: i32,
        iterations: u32,
    ) -> BenchmarkReport {
        let seat_count = seat_count.max(1);
        let previous = self.service.set_strategy(strategy);
        let started = Instant::now();
        let mut succeeded = 0;

        for i in 0..iterations {
            let seat_number = (i % seat_count as u32) as i32 + 1;
            let actor_id = format!("user{i}");

            match self.cycle(event_id, seat_number, &actor_id).await {
                Ok(()) => succeeded += 1,
                Err(e) => warn!(iteration = i, seat_number, error = %e, "Benchmark iteration failed"),
            }
        }

        let elapsed = started.elapsed();
        self.service.set_strategy(previous);

        let report = BenchmarkReport {
            strategy,
            iterations,
            succeeded,
            failed: iterations - succeeded,
            elapsed,
        };
        info!(
            strategy = %report.strategy,
            iterations,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Benchmark finished"
        );
        report
    }

    async fn cycle(&self, event_id: &str, seat_number: i32, actor_id: &str) -> crate::ReservationResult<()> {
        self.service.hold(event_id, seat_number, actor_id).await?;
        self.service.reserve(event_id, seat_number, actor_id).await?;
        self.service.release(event_id, seat_number, actor_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ReservationSettings;
    use boxoffice_core::ManualClock;
    use boxoffice_shared::SeatStatus;
    use boxoffice_store::{MemoryLeaseStore, MemorySeatRepository};

    async fn runner() -> (BenchmarkRunner, Arc<SeatReservationService>, Arc<MemorySeatRepository>) {
        let clock = Arc::new(ManualClock::default());
        let seats = Arc::new(MemorySeatRepository::new());
        seats.seed("bench", 4).await;
        let leases = Arc::new(MemoryLeaseStore::new(clock.clone()));
        let service = Arc::new(SeatReservationService::new(
            seats.clone(),
            leases,
            clock,
            ReservationSettings::default(),
        ));
        (BenchmarkRunner::new(service.clone()), service, seats)
    }

    #[tokio::test]
    async fn test_every_cycle_succeeds_on_free_seats() {
        let (runner, service, seats) = runner().await;

        for kind in [StrategyKind::Optimistic, StrategyKind::LeaseBased] {
            let report = runner.run(kind, "bench", 4, 10).await;
            assert_eq!(report.strategy, kind);
            assert_eq!(report.succeeded, 10);
            assert_eq!(report.failed, 0);
        }

        assert_eq!(service.current_strategy(), StrategyKind::Optimistic);
        let seat = seats.find_by_number("bench", 1).await.unwrap();
        assert_eq!(seat.status, SeatStatus::Available);
        // 3 cycles per strategy on seat 1, three transitions each
        assert_eq!(seat.version, 18);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let (runner, service, _) = runner().await;
        service.hold("bench", 2, "squatter").await.unwrap();

        let report = runner.run(StrategyKind::Optimistic, "bench", 4, 4).await;
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_missing_seats_all_fail_and_seat_count_is_clamped() {
        let (runner, _, _) = runner().await;

        let report = runner.run(StrategyKind::LeaseBased, "no-such-event", 0, 3).await;
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 3);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["elapsed_ms"].is_u64());
    }
}
