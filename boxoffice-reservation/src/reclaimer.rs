use std::sync::Arc;
use std::time::Duration;

use boxoffice_core::{Clock, SeatChange, SeatFilter, SeatRepository, StoreResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Periodically returns lapsed holds to `available`.
///
/// Works on the seat table directly, outside either strategy: one bulk
/// statement per sweep matching `held` rows whose `held_until` is in the past.
/// Rows it touches still get their version bumped, so any strategy call that
/// read them beforehand loses its compare-and-swap.
pub struct ExpiryReclaimer {
    seats: Arc<dyn SeatRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ExpiryReclaimer {
    pub fn new(seats: Arc<dyn SeatRepository>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            seats,
            clock,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One pass; returns how many seats were released
    pub async fn sweep(&self) -> StoreResult<u64> {
        let now = self.clock.now();
        debug!(%now, "Sweeping expired holds");

        let released = self
            .seats
            .bulk_conditional_update(&SeatFilter::expired_holds(now), &SeatChange::available())
            .await?;

        if released > 0 {
            info!(released, "Released expired seat holds");
        }
        Ok(released)
    }

    /// Like `sweep`, but a failure is logged and swallowed so the next tick still runs
    pub async fn tick(&self) -> u64 {
        match self.sweep().await {
            Ok(released) => released,
            Err(e) => {
                error!(error = %e, "Expired hold sweep failed");
                0
            }
        }
    }

    /// Runs `tick` on the configured interval until `shutdown` flips to true
    /// or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = self.interval.as_millis() as u64, "Expiry reclaimer started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Expiry reclaimer stopped");
        })
    }
}
