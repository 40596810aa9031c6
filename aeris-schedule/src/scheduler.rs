use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flight::{Flight, FlightStatus};

/// Everything needed to put a new flight on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub aircraft_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub base_price_cents: i64,
    pub owner: Option<String>,
}

impl ScheduleRequest {
    /// Temporal and geometric invariants, shared by every persistence
    /// path. Returns the derived flight duration.
    pub fn validate(&self) -> CoreResult<Duration> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();

        if origin.is_empty() || destination.is_empty() {
            return Err(CoreError::ValidationError(
                "origin and destination must not be empty".to_string(),
            ));
        }

        if origin == destination {
            return Err(CoreError::ValidationError(
                "origin and destination must differ".to_string(),
            ));
        }

        if self.arrival <= self.departure {
            return Err(CoreError::ValidationError(
                "arrival must be after departure".to_string(),
            ));
        }

        if self.departure <= Utc::now() {
            return Err(CoreError::ValidationError(
                "departure must be in the future".to_string(),
            ));
        }

        if self.base_price_cents <= 0 {
            return Err(CoreError::ValidationError(
                "base price must be greater than 0".to_string(),
            ));
        }

        Ok(self.arrival - self.departure)
    }
}

/// Flight board with aircraft double-booking protection.
pub struct FlightSchedule {
    flights: HashMap<Uuid, Flight>,
}

impl FlightSchedule {
    pub fn new() -> Self {
        Self {
            flights: HashMap::new(),
        }
    }

    /// Validate the request, scan the same aircraft's live flights for an
    /// interval overlap, and store the flight. Overlap rejection is
    /// unconditional: an aircraft is never double-booked across time.
    pub fn schedule(&mut self, request: ScheduleRequest) -> CoreResult<Uuid> {
        let duration = request.validate()?;

        let conflict = self.flights.values().find(|other| {
            other.aircraft_id == request.aircraft_id
                && other.status.blocks_aircraft()
                && other.overlaps(request.departure, request.arrival)
        });
        if let Some(other) = conflict {
            return Err(CoreError::ConflictError(format!(
                "aircraft {} is already booked by flight {}",
                request.aircraft_id, other
            )));
        }

        let flight = Flight {
            id: Uuid::new_v4(),
            aircraft_id: request.aircraft_id,
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            departure: request.departure,
            arrival: request.arrival,
            duration_minutes: duration.num_minutes(),
            status: FlightStatus::Scheduled,
            base_price_cents: request.base_price_cents,
            owner: request.owner,
        };

        let id = flight.id;
        tracing::info!(flight_id = %id, aircraft_id = %flight.aircraft_id, "flight scheduled");
        self.flights.insert(id, flight);
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Flight> {
        self.flights.get(id)
    }

    /// All flights ordered by departure time.
    pub fn list_by_departure(&self) -> Vec<&Flight> {
        let mut flights: Vec<&Flight> = self.flights.values().collect();
        flights.sort_by_key(|f| f.departure);
        flights
    }

    pub fn set_status(&mut self, id: &Uuid, status: FlightStatus) -> CoreResult<()> {
        let flight = self
            .flights
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFoundError(format!("flight {}", id)))?;

        if !flight.status.can_transition(status) {
            return Err(CoreError::ValidationError(format!(
                "flight cannot move from {} to {}",
                flight.status.as_str(),
                status.as_str()
            )));
        }

        flight.status = status;
        Ok(())
    }

    /// Drop every flight bound to an aircraft; used by the registry cascade.
    pub fn remove_for_aircraft(&mut self, aircraft_id: &Uuid) -> Vec<Flight> {
        let ids: Vec<Uuid> = self
            .flights
            .values()
            .filter(|f| f.aircraft_id == *aircraft_id)
            .map(|f| f.id)
            .collect();

        ids.iter().filter_map(|id| self.flights.remove(id)).collect()
    }
}

impl Default for FlightSchedule {
    fn default() -> Self {
        Self::new()
    }
}
