use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ReservationStatus::Active),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }
}

/// The seat-flight-passenger triple link, priced and identified by a
/// confirmation code usable for unauthenticated lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub passenger_id: Uuid,
    pub seat_id: Uuid,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub price_cents: i64,
    pub confirmation_code: Uuid,
}

impl Reservation {
    pub fn new(flight_id: Uuid, passenger_id: Uuid, seat_id: Uuid, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_id,
            passenger_id,
            seat_id,
            status: ReservationStatus::Active,
            created_at: Utc::now(),
            price_cents,
            confirmation_code: Uuid::new_v4(),
        }
    }
}

impl std::fmt::Display for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reservation {}", self.confirmation_code.simple())
    }
}
