pub mod seat;
pub mod strategy;
