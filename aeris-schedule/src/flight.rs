use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Airborne,
    Completed,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Airborne => "airborne",
            FlightStatus::Completed => "completed",
            FlightStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(FlightStatus::Scheduled),
            "airborne" => Some(FlightStatus::Airborne),
            "completed" => Some(FlightStatus::Completed),
            "cancelled" => Some(FlightStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a flight in this status keeps its aircraft busy for
    /// conflict detection.
    pub fn blocks_aircraft(&self) -> bool {
        matches!(self, FlightStatus::Scheduled | FlightStatus::Airborne)
    }

    pub fn can_transition(&self, to: FlightStatus) -> bool {
        matches!(
            (self, to),
            (FlightStatus::Scheduled, FlightStatus::Airborne)
                | (FlightStatus::Airborne, FlightStatus::Completed)
                | (FlightStatus::Scheduled, FlightStatus::Cancelled)
                | (FlightStatus::Airborne, FlightStatus::Cancelled)
        )
    }
}

/// A scheduled leg bound to one aircraft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub aircraft_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: FlightStatus,
    pub base_price_cents: i64,
    pub owner: Option<String>,
}

impl Flight {
    /// Half-open interval overlap on [departure, arrival); a boundary
    /// touch is not a conflict.
    pub fn overlaps(&self, departure: DateTime<Utc>, arrival: DateTime<Utc>) -> bool {
        departure < self.arrival && arrival > self.departure
    }
}

impl std::fmt::Display for Flight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.origin,
            self.destination,
            self.departure.date_naive()
        )
    }
}
