pub mod models;

pub use models::seat::{LeaseKey, Seat, SeatStatus};
pub use models::strategy::StrategyKind;
