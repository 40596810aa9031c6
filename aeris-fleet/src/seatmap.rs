use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cabin column letters in board order; an aircraft uses the first
/// `columns` of them.
pub const COLUMN_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    Premium,
    Business,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::Premium => "premium",
            CabinClass::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "economy" => Some(CabinClass::Economy),
            "premium" => Some(CabinClass::Premium),
            "business" => Some(CabinClass::Business),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Occupied,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Held => "held",
            SeatStatus::Occupied => "occupied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SeatStatus::Available),
            "held" => Some(SeatStatus::Held),
            "occupied" => Some(SeatStatus::Occupied),
            _ => None,
        }
    }
}

/// Row-banding policy: the first `business_rows` rows are Business, the
/// next `premium_rows` Premium, the remainder Economy. Pure function of
/// the row index, injected so deployments (and tests) can reshape cabins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CabinLayout {
    pub business_rows: i32,
    pub premium_rows: i32,
}

impl CabinLayout {
    pub fn cabin_for_row(&self, row: i32) -> CabinClass {
        if row <= self.business_rows {
            CabinClass::Business
        } else if row <= self.business_rows + self.premium_rows {
            CabinClass::Premium
        } else {
            CabinClass::Economy
        }
    }
}

impl Default for CabinLayout {
    fn default() -> Self {
        Self {
            business_rows: 2,
            premium_rows: 4,
        }
    }
}

/// A single seat in an aircraft cabin.
///
/// `status` is deliberately private: the only legal transitions are
/// [`SeatInventory::hold`] and [`SeatInventory::release`], so no caller can
/// leave a seat in a state the reservation records do not agree with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub aircraft_id: Uuid,
    pub number: String,
    pub row: i32,
    pub column: char,
    pub cabin: CabinClass,
    status: SeatStatus,
}

impl Seat {
    pub fn new(aircraft_id: Uuid, row: i32, column: char, cabin: CabinClass) -> Self {
        Self {
            id: Uuid::new_v4(),
            aircraft_id,
            number: format!("{}{}", row, column),
            row,
            column,
            cabin,
            status: SeatStatus::Available,
        }
    }

    /// Rehydrate a seat from persisted state. Not a mutation path: the
    /// store reads whatever the last committed transaction wrote.
    pub fn restore(
        id: Uuid,
        aircraft_id: Uuid,
        number: String,
        row: i32,
        column: char,
        cabin: CabinClass,
        status: SeatStatus,
    ) -> Self {
        Self {
            id,
            aircraft_id,
            number,
            row,
            column,
            cabin,
            status,
        }
    }

    pub fn status(&self) -> SeatStatus {
        self.status
    }

    /// Bounds checks against the owning aircraft's geometry.
    pub fn validate(&self, aircraft: &crate::aircraft::Aircraft) -> CoreResult<()> {
        if self.row <= 0 || self.row > aircraft.rows {
            return Err(CoreError::ValidationError(format!(
                "row {} is outside 1..={}",
                self.row, aircraft.rows
            )));
        }

        let allowed = &COLUMN_LETTERS[..aircraft.columns as usize];
        if !allowed.contains(&self.column) {
            return Err(CoreError::ValidationError(format!(
                "column {} is not one of {:?}",
                self.column, allowed
            )));
        }

        Ok(())
    }
}

/// Per-aircraft seat collection with the only mutable view of seat status.
pub struct SeatInventory {
    seats: HashMap<Uuid, Seat>,
}

impl SeatInventory {
    pub fn new() -> Self {
        Self {
            seats: HashMap::new(),
        }
    }

    /// Generate the full rows x columns grid for an aircraft, classed by
    /// the banding policy. Fails if the aircraft already has seats.
    pub fn provision(
        &mut self,
        aircraft: &crate::aircraft::Aircraft,
        layout: &CabinLayout,
    ) -> CoreResult<Vec<Uuid>> {
        aircraft.validate()?;

        if self.seat_count(&aircraft.id) > 0 {
            return Err(CoreError::ValidationError(format!(
                "aircraft {} already has seats provisioned",
                aircraft.id
            )));
        }

        let mut ids = Vec::with_capacity(aircraft.capacity as usize);
        for row in 1..=aircraft.rows {
            for column in &COLUMN_LETTERS[..aircraft.columns as usize] {
                let seat = Seat::new(aircraft.id, row, *column, layout.cabin_for_row(row));
                ids.push(seat.id);
                self.seats.insert(seat.id, seat);
            }
        }

        tracing::info!(aircraft_id = %aircraft.id, seats = ids.len(), "provisioned seat map");
        Ok(ids)
    }

    /// Add a single seat, enforcing geometry bounds and the
    /// (aircraft, number) uniqueness rule.
    pub fn add(&mut self, aircraft: &crate::aircraft::Aircraft, seat: Seat) -> CoreResult<Uuid> {
        seat.validate(aircraft)?;

        if self.find_by_number(&seat.aircraft_id, &seat.number).is_some() {
            return Err(CoreError::ValidationError(format!(
                "seat {} already exists on aircraft {}",
                seat.number, seat.aircraft_id
            )));
        }

        let id = seat.id;
        self.seats.insert(id, seat);
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Seat> {
        self.seats.get(id)
    }

    pub fn find_by_number(&self, aircraft_id: &Uuid, number: &str) -> Option<&Seat> {
        self.seats
            .values()
            .find(|s| s.aircraft_id == *aircraft_id && s.number == number)
    }

    /// Available seats for an aircraft, ordered by (row, column), with an
    /// optional cabin filter.
    pub fn available(&self, aircraft_id: &Uuid, cabin: Option<CabinClass>) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self
            .seats
            .values()
            .filter(|s| {
                s.aircraft_id == *aircraft_id
                    && s.status == SeatStatus::Available
                    && cabin.map_or(true, |c| s.cabin == c)
            })
            .collect();
        seats.sort_by_key(|s| (s.row, s.column));
        seats
    }

    pub fn seat_count(&self, aircraft_id: &Uuid) -> usize {
        self.seats
            .values()
            .filter(|s| s.aircraft_id == *aircraft_id)
            .count()
    }

    /// Available -> Held. The check and the flip happen under the same
    /// mutable borrow, so two callers cannot both win the seat.
    pub fn hold(&mut self, seat_id: &Uuid) -> CoreResult<()> {
        let seat = self
            .seats
            .get_mut(seat_id)
            .ok_or_else(|| CoreError::NotFoundError(format!("seat {}", seat_id)))?;

        if seat.status != SeatStatus::Available {
            return Err(CoreError::SeatUnavailableError(format!(
                "seat {} is {}",
                seat.number,
                seat.status.as_str()
            )));
        }

        seat.status = SeatStatus::Held;
        Ok(())
    }

    /// Held -> Available. Reports whether a release actually happened, so
    /// repeated cancellations never free a seat twice.
    pub fn release(&mut self, seat_id: &Uuid) -> CoreResult<bool> {
        let seat = self
            .seats
            .get_mut(seat_id)
            .ok_or_else(|| CoreError::NotFoundError(format!("seat {}", seat_id)))?;

        if seat.status == SeatStatus::Held {
            seat.status = SeatStatus::Available;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn remove_aircraft_seats(&mut self, aircraft_id: &Uuid) -> usize {
        let before = self.seats.len();
        self.seats.retain(|_, s| s.aircraft_id != *aircraft_id);
        before - self.seats.len()
    }
}

impl Default for SeatInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::Aircraft;

    fn provisioned() -> (Aircraft, SeatInventory) {
        let aircraft = Aircraft::new("A320", 48, 12, 4);
        let mut inventory = SeatInventory::new();
        inventory.provision(&aircraft, &CabinLayout::default()).unwrap();
        (aircraft, inventory)
    }

    #[test]
    fn test_provision_generates_full_grid() {
        let (aircraft, inventory) = provisioned();

        assert_eq!(inventory.seat_count(&aircraft.id), 48);

        let available = inventory.available(&aircraft.id, None);
        assert_eq!(available.len(), 48);
        assert_eq!(available[0].number, "1A");
        assert_eq!(available[3].number, "1D");
        assert_eq!(available[47].number, "12D");
    }

    #[test]
    fn test_default_banding() {
        let (aircraft, inventory) = provisioned();

        let seat = |n: &str| inventory.find_by_number(&aircraft.id, n).unwrap();
        assert_eq!(seat("1A").cabin, CabinClass::Business);
        assert_eq!(seat("2D").cabin, CabinClass::Business);
        assert_eq!(seat("3A").cabin, CabinClass::Premium);
        assert_eq!(seat("6D").cabin, CabinClass::Premium);
        assert_eq!(seat("7A").cabin, CabinClass::Economy);
        assert_eq!(seat("12D").cabin, CabinClass::Economy);
    }

    #[test]
    fn test_injected_banding_policy() {
        let aircraft = Aircraft::new("E190", 48, 12, 4);
        let mut inventory = SeatInventory::new();
        let all_economy = CabinLayout {
            business_rows: 0,
            premium_rows: 0,
        };
        inventory.provision(&aircraft, &all_economy).unwrap();

        assert_eq!(
            inventory.available(&aircraft.id, Some(CabinClass::Economy)).len(),
            48
        );
        assert!(inventory
            .available(&aircraft.id, Some(CabinClass::Business))
            .is_empty());
    }

    #[test]
    fn test_hold_wins_once() {
        let (aircraft, mut inventory) = provisioned();
        let seat_id = inventory.find_by_number(&aircraft.id, "7A").unwrap().id;

        inventory.hold(&seat_id).unwrap();
        let err = inventory.hold(&seat_id).unwrap_err();
        assert!(matches!(err, CoreError::SeatUnavailableError(_)));
    }

    #[test]
    fn test_release_only_from_held() {
        let (aircraft, mut inventory) = provisioned();
        let seat_id = inventory.find_by_number(&aircraft.id, "7A").unwrap().id;

        assert!(!inventory.release(&seat_id).unwrap());

        inventory.hold(&seat_id).unwrap();
        assert!(inventory.release(&seat_id).unwrap());
        assert!(!inventory.release(&seat_id).unwrap());
    }

    #[test]
    fn test_duplicate_seat_number_rejected() {
        let (aircraft, mut inventory) = provisioned();
        let dup = Seat::new(aircraft.id, 7, 'A', CabinClass::Economy);
        assert!(inventory.add(&aircraft, dup).is_err());
    }

    #[test]
    fn test_out_of_bounds_seat_rejected() {
        let (aircraft, mut inventory) = provisioned();

        let bad_row = Seat::new(aircraft.id, 13, 'A', CabinClass::Economy);
        assert!(inventory.add(&aircraft, bad_row).is_err());

        // Four-abreast cabin has no column E.
        let bad_column = Seat::new(aircraft.id, 7, 'E', CabinClass::Economy);
        assert!(inventory.add(&aircraft, bad_column).is_err());
    }
}
