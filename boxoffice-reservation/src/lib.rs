pub mod benchmark;
pub mod error;
pub mod lease;
pub mod occ;
pub mod reclaimer;
pub mod retry;
pub mod service;
pub mod strategy;

pub use benchmark::{BenchmarkReport, BenchmarkRunner};
pub use error::{ReservationError, ReservationResult};
pub use lease::LeaseStrategy;
pub use occ::OptimisticStrategy;
pub use reclaimer::ExpiryReclaimer;
pub use retry::{retry_on_conflict, RetryPolicy};
pub use service::{HealthReport, HealthStatus, ReservationSettings, SeatReservationService};
pub use strategy::{ReservationStrategy, StrategySelector};
