use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use boxoffice_shared::{Seat, StrategyKind};

use crate::error::ReservationResult;

/// One way of coordinating concurrent hold/reserve/release calls.
///
/// Every implementation exposes the same observable contract; they differ
/// only in where the serialization point for a seat lives.
#[async_trait]
pub trait ReservationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn hold(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat>;

    async fn reserve(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat>;

    async fn release(&self, event_id: &str, seat_number: i32, actor_id: &str) -> ReservationResult<Seat>;
}

const OPTIMISTIC: u8 = 0;
const LEASE_BASED: u8 = 1;

fn encode(kind: StrategyKind) -> u8 {
    match kind {
        StrategyKind::Optimistic => OPTIMISTIC,
        StrategyKind::LeaseBased => LEASE_BASED,
    }
}

fn decode(value: u8) -> StrategyKind {
    match value {
        LEASE_BASED => StrategyKind::LeaseBased,
        _ => StrategyKind::Optimistic,
    }
}

/// Shared cell holding the active strategy.
///
/// Reads happen once at operation entry, so a change only affects calls
/// that start after it.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    current: Arc<AtomicU8>,
}

impl StrategySelector {
    pub fn new(initial: StrategyKind) -> Self {
        Self {
            current: Arc::new(AtomicU8::new(encode(initial))),
        }
    }

    pub fn current(&self) -> StrategyKind {
        decode(self.current.load(Ordering::SeqCst))
    }

    /// Switches strategy and returns the one it replaced
    pub fn set(&self, kind: StrategyKind) -> StrategyKind {
        decode(self.current.swap(encode(kind), Ordering::SeqCst))
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(StrategyKind::default())
    }
}
