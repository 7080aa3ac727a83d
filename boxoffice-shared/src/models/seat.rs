use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Seat availability in the hold/reserve lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Reserved,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Held => "held",
            SeatStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SeatStatus::Available),
            "held" => Ok(SeatStatus::Held),
            "reserved" => Ok(SeatStatus::Reserved),
            other => Err(format!("unknown seat status: {}", other)),
        }
    }
}

/// A single seat of an event, as stored by the seat repository.
///
/// `version` starts at 0 and grows by exactly one on every transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub id: Uuid,
    pub event_id: String,
    pub number: i32,
    pub status: SeatStatus,
    pub held_by: Option<String>,
    pub held_until: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Seat {
    /// A fresh, available seat at version 0
    pub fn new(event_id: impl Into<String>, number: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.into(),
            number,
            status: SeatStatus::Available,
            held_by: None,
            held_until: None,
            version: 0,
        }
    }

    pub fn lease_key(&self) -> LeaseKey {
        LeaseKey::new(&self.event_id, self.number)
    }

    /// Whether `actor_id` holds this seat and the hold is still running at `now`
    pub fn is_held_by(&self, actor_id: &str, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Held
            && self.held_by.as_deref() == Some(actor_id)
            && self.held_until.map_or(false, |until| until > now)
    }

    pub fn is_hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Held && self.held_until.map_or(false, |until| until < now)
    }

    /// Checks the status/holder/expiry combination is one the lifecycle can produce
    pub fn is_consistent(&self) -> bool {
        match self.status {
            SeatStatus::Available => self.held_by.is_none() && self.held_until.is_none(),
            SeatStatus::Held => self.held_by.is_some() && self.held_until.is_some(),
            SeatStatus::Reserved => self.held_by.is_some() && self.held_until.is_none(),
        }
    }
}

/// Lease key for a seat: `hold:{event_id}:{seat_number}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseKey(String);

impl LeaseKey {
    pub fn new(event_id: &str, seat_number: i32) -> Self {
        Self(format!("hold:{}:{}", event_id, seat_number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
