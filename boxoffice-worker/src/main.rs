use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use boxoffice_core::SystemClock;
use boxoffice_reservation::{ExpiryReclaimer, ReservationSettings, RetryPolicy, SeatReservationService};
use boxoffice_store::app_config::{Config, ReservationConfig};
use boxoffice_store::{DbClient, PgSeatRepository, RedisLeaseStore};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn reservation_settings(config: &ReservationConfig) -> ReservationSettings {
    ReservationSettings {
        hold_seconds: config.hold_seconds,
        default_strategy: config.default_strategy,
        retry: RetryPolicy::new(config.retry_attempts, Duration::from_millis(config.retry_delay_ms)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boxoffice_worker=debug,boxoffice_reservation=debug,boxoffice_store=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        strategy = %config.reservation.default_strategy,
        hold_seconds = config.reservation.hold_seconds,
        "Starting boxoffice worker"
    );

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    let seats = Arc::new(PgSeatRepository::new(db.pool.clone()));

    // Redis
    let leases = Arc::new(
        RedisLeaseStore::new(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?,
    );

    let clock = Arc::new(SystemClock);
    let service = Arc::new(SeatReservationService::new(
        seats.clone(),
        leases,
        clock.clone(),
        reservation_settings(&config.reservation),
    ));

    let health = service.health().await;
    match serde_json::to_string(&health) {
        Ok(report) => tracing::info!(%report, "Reservation service ready"),
        Err(e) => tracing::warn!(error = %e, "Could not encode health report"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reclaimer = ExpiryReclaimer::new(
        seats,
        clock,
        Duration::from_secs(config.reclaimer.interval_seconds),
    )
    .spawn(shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    // A send error only means the reclaimer already exited
    let _ = shutdown_tx.send(true);
    reclaimer.await.context("Expiry reclaimer panicked")?;

    Ok(())
}
