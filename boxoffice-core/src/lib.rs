pub mod clock;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{LeaseStore, SeatChange, SeatFilter, SeatRepository};

/// Failure talking to one of the external stores
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Seat store unavailable: {0}")]
    Database(String),
    #[error("Lease store unavailable: {0}")]
    LeaseStore(String),
    #[error("Corrupt seat record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
