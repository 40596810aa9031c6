use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use aeris_fleet::aircraft::{Aircraft, AircraftRegistry};
use aeris_fleet::seatmap::{CabinClass, CabinLayout, Seat, SeatInventory, SeatStatus};
use aeris_schedule::flight::Flight;
use aeris_schedule::scheduler::{FlightSchedule, ScheduleRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fares::FarePolicy;
use crate::passenger::{Passenger, PassengerDirectory, PassengerForm};
use crate::reservation::{Reservation, ReservationStatus};
use crate::ticket::{Ticket, TicketService};

/// What a successful booking hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub reservation: Reservation,
    pub ticket: Ticket,
}

/// Seat counts for one flight's aircraft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOccupancy {
    pub available: usize,
    pub total: usize,
    pub by_cabin: HashMap<CabinClass, usize>,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationOutcome {
    Cancelled,
    AlreadyCancelled,
}

/// The consistency core: every seat status change happens inside one of
/// these operations, paired with the reservation write that justifies it.
///
/// Operations validate everything up front and only then mutate, so each
/// call is all-or-nothing and a seat is never left Held without an Active
/// reservation (or the other way around).
pub struct ReservationEngine {
    registry: AircraftRegistry,
    inventory: SeatInventory,
    schedule: FlightSchedule,
    directory: PassengerDirectory,
    tickets: TicketService,
    reservations: HashMap<Uuid, Reservation>,
    by_code: HashMap<Uuid, Uuid>,
    fares: FarePolicy,
    layout: CabinLayout,
}

impl ReservationEngine {
    pub fn new(fares: FarePolicy, layout: CabinLayout) -> Self {
        Self {
            registry: AircraftRegistry::new(),
            inventory: SeatInventory::new(),
            schedule: FlightSchedule::new(),
            directory: PassengerDirectory::new(),
            tickets: TicketService::new(),
            reservations: HashMap::new(),
            by_code: HashMap::new(),
            fares,
            layout,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FarePolicy::default(), CabinLayout::default())
    }

    /// Register an aircraft and provision its seat map in one step.
    pub fn register_aircraft(
        &mut self,
        model: &str,
        capacity: i32,
        rows: i32,
        columns: i32,
    ) -> CoreResult<Uuid> {
        let aircraft = Aircraft::new(model, capacity, rows, columns);
        let id = self.registry.upsert(aircraft.clone())?;
        self.inventory.provision(&aircraft, &self.layout)?;
        Ok(id)
    }

    /// Edit an aircraft, revalidating the geometry. A geometry change
    /// regenerates the seat map and is only allowed while every seat is
    /// still Available.
    pub fn update_aircraft(
        &mut self,
        id: Uuid,
        model: &str,
        capacity: i32,
        rows: i32,
        columns: i32,
    ) -> CoreResult<()> {
        let existing = self
            .registry
            .get(&id)
            .ok_or_else(|| CoreError::NotFoundError(format!("aircraft {}", id)))?;
        let geometry_changed = existing.rows != rows || existing.columns != columns;

        let updated = Aircraft {
            id,
            model: model.to_string(),
            capacity,
            rows,
            columns,
        };
        updated.validate()?;

        if geometry_changed {
            let total = self.inventory.seat_count(&id);
            if self.inventory.available(&id, None).len() != total {
                return Err(CoreError::ValidationError(
                    "cannot reshape the cabin while seats are held or occupied".to_string(),
                ));
            }
            self.inventory.remove_aircraft_seats(&id);
            self.registry.upsert(updated.clone())?;
            self.inventory.provision(&updated, &self.layout)?;
        } else {
            self.registry.upsert(updated)?;
        }

        Ok(())
    }

    /// Remove an aircraft and everything it owns: seats, flights, their
    /// reservations, and their tickets.
    pub fn retire_aircraft(&mut self, id: &Uuid) -> CoreResult<()> {
        self.registry
            .remove(id)
            .ok_or_else(|| CoreError::NotFoundError(format!("aircraft {}", id)))?;

        self.inventory.remove_aircraft_seats(id);

        let removed_flights = self.schedule.remove_for_aircraft(id);
        for flight in &removed_flights {
            let orphaned: Vec<Uuid> = self
                .reservations
                .values()
                .filter(|r| r.flight_id == flight.id)
                .map(|r| r.id)
                .collect();
            for reservation_id in orphaned {
                if let Some(reservation) = self.reservations.remove(&reservation_id) {
                    self.by_code.remove(&reservation.confirmation_code);
                }
                self.tickets.remove_for_reservation(&reservation_id);
            }
        }

        tracing::info!(aircraft_id = %id, flights = removed_flights.len(), "aircraft retired");
        Ok(())
    }

    pub fn schedule_flight(&mut self, request: ScheduleRequest) -> CoreResult<Uuid> {
        if self.registry.get(&request.aircraft_id).is_none() {
            return Err(CoreError::NotFoundError(format!(
                "aircraft {}",
                request.aircraft_id
            )));
        }
        self.schedule.schedule(request)
    }

    /// Available seats for a flight, ordered by (row, column).
    pub fn list_available_seats(
        &self,
        flight_id: &Uuid,
        cabin: Option<CabinClass>,
    ) -> CoreResult<Vec<&Seat>> {
        let flight = self.flight_or_not_found(flight_id)?;
        Ok(self.inventory.available(&flight.aircraft_id, cabin))
    }

    /// Book a seat on a flight for a passenger, atomically.
    ///
    /// Checks run in order: flight and seat exist and belong together,
    /// the seat is still Available at commit time, the passenger fields
    /// are valid, and no active reservation already pairs this passenger
    /// with this flight. Only after every check passes does state change:
    /// the reservation is recorded, the seat moves to Held, and the
    /// ticket is issued.
    pub fn create_reservation(
        &mut self,
        flight_id: &Uuid,
        seat_id: &Uuid,
        form: &PassengerForm,
    ) -> CoreResult<BookingConfirmation> {
        let flight = self.flight_or_not_found(flight_id)?;
        let (flight_aircraft, base_price_cents) = (flight.aircraft_id, flight.base_price_cents);

        let seat = self
            .inventory
            .get(seat_id)
            .ok_or_else(|| CoreError::NotFoundError(format!("seat {}", seat_id)))?;
        if seat.aircraft_id != flight_aircraft {
            return Err(CoreError::ValidationError(format!(
                "seat {} does not belong to the flight's aircraft",
                seat.number
            )));
        }
        if seat.status() != SeatStatus::Available {
            return Err(CoreError::SeatUnavailableError(format!(
                "seat {} is {}",
                seat.number,
                seat.status().as_str()
            )));
        }
        let (seat_cabin, seat_number) = (seat.cabin, seat.number.clone());

        form.validate()?;

        if let Some(existing) = self.directory.peek(&form.document) {
            let duplicate = self.reservations.values().any(|r| {
                r.flight_id == *flight_id
                    && r.passenger_id == existing.id
                    && r.status == ReservationStatus::Active
            });
            if duplicate {
                return Err(CoreError::DuplicateReservationError(format!(
                    "passenger {} already holds an active reservation on this flight",
                    existing.document
                )));
            }
        }

        let price_cents = self.fares.quote(base_price_cents, seat_cabin)?;

        // Every check has passed; from here on nothing can fail.
        let (passenger_id, _) = self.directory.find_or_create(form)?;
        let reservation = Reservation::new(*flight_id, passenger_id, *seat_id, price_cents);

        self.by_code.insert(reservation.confirmation_code, reservation.id);
        self.reservations.insert(reservation.id, reservation.clone());
        self.inventory.hold(seat_id)?;
        let ticket = self.tickets.issue(reservation.id)?;

        tracing::info!(
            reservation_id = %reservation.id,
            flight_id = %flight_id,
            seat = %seat_number,
            price_cents,
            "reservation created"
        );

        Ok(BookingConfirmation {
            reservation,
            ticket,
        })
    }

    /// Cancel a reservation: Active -> Cancelled, the seat released if it
    /// is still Held, the ticket voided if one exists. Cancelling twice
    /// is a reported no-op that never frees the seat a second time.
    pub fn cancel_reservation(&mut self, id: &Uuid) -> CoreResult<CancellationOutcome> {
        let reservation = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFoundError(format!("reservation {}", id)))?;

        match reservation.status {
            ReservationStatus::Cancelled => return Ok(CancellationOutcome::AlreadyCancelled),
            ReservationStatus::Completed => {
                return Err(CoreError::ValidationError(
                    "a completed reservation cannot be cancelled".to_string(),
                ))
            }
            ReservationStatus::Active => {}
        }

        reservation.status = ReservationStatus::Cancelled;
        let seat_id = reservation.seat_id;

        self.inventory.release(&seat_id)?;
        self.tickets.void_for_reservation(id);

        tracing::info!(reservation_id = %id, "reservation cancelled");
        Ok(CancellationOutcome::Cancelled)
    }

    /// Exact-match lookup by confirmation code. Malformed input is just a
    /// miss, never a different failure.
    pub fn lookup_by_code(&self, code: &str) -> CoreResult<&Reservation> {
        let parsed = Uuid::parse_str(code.trim())
            .map_err(|_| CoreError::NotFoundError(format!("reservation code {}", code)))?;

        self.by_code
            .get(&parsed)
            .and_then(|id| self.reservations.get(id))
            .ok_or_else(|| CoreError::NotFoundError(format!("reservation code {}", code)))
    }

    pub fn flight_occupancy(&self, flight_id: &Uuid) -> CoreResult<FlightOccupancy> {
        let flight = self.flight_or_not_found(flight_id)?;
        let aircraft_id = flight.aircraft_id;

        let total = self.inventory.seat_count(&aircraft_id);
        let available_seats = self.inventory.available(&aircraft_id, None);

        let mut by_cabin: HashMap<CabinClass, usize> = HashMap::new();
        for seat in &available_seats {
            *by_cabin.entry(seat.cabin).or_insert(0) += 1;
        }

        let available = available_seats.len();
        let percent = if total == 0 {
            0.0
        } else {
            (total - available) as f64 / total as f64 * 100.0
        };

        Ok(FlightOccupancy {
            available,
            total,
            by_cabin,
            percent,
        })
    }

    pub fn aircraft(&self, id: &Uuid) -> Option<&Aircraft> {
        self.registry.get(id)
    }

    pub fn flight(&self, id: &Uuid) -> Option<&Flight> {
        self.schedule.get(id)
    }

    pub fn seat(&self, id: &Uuid) -> Option<&Seat> {
        self.inventory.get(id)
    }

    pub fn seat_by_number(&self, aircraft_id: &Uuid, number: &str) -> Option<&Seat> {
        self.inventory.find_by_number(aircraft_id, number)
    }

    pub fn passenger(&self, id: &Uuid) -> Option<&Passenger> {
        self.directory.get(id)
    }

    pub fn reservation(&self, id: &Uuid) -> Option<&Reservation> {
        self.reservations.get(id)
    }

    pub fn ticket_for(&self, reservation_id: &Uuid) -> Option<&Ticket> {
        self.tickets.get_for_reservation(reservation_id)
    }

    fn flight_or_not_found(&self, flight_id: &Uuid) -> CoreResult<&Flight> {
        self.schedule
            .get(flight_id)
            .ok_or_else(|| CoreError::NotFoundError(format!("flight {}", flight_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeris_core::document::DocumentType;
    use chrono::{Duration, NaiveDate, Utc};

    fn passenger_form(name: &str, document: &str) -> PassengerForm {
        PassengerForm {
            name: name.to_string(),
            document: document.to_string(),
            email: format!("{}@example.com", document),
            phone: "+54 11 5555 0000".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1988, 3, 2).unwrap(),
            document_type: DocumentType::Dni,
        }
    }

    fn engine_with_flight() -> (ReservationEngine, Uuid, Uuid) {
        let mut engine = ReservationEngine::with_defaults();
        let aircraft_id = engine.register_aircraft("A320", 72, 12, 6).unwrap();

        let departure = Utc::now() + Duration::days(30);
        let flight_id = engine
            .schedule_flight(ScheduleRequest {
                aircraft_id,
                origin: "EZE".to_string(),
                destination: "COR".to_string(),
                departure,
                arrival: departure + Duration::hours(2),
                base_price_cents: 10_000,
                owner: None,
            })
            .unwrap();

        (engine, aircraft_id, flight_id)
    }

    #[test]
    fn test_booking_holds_seat_and_issues_ticket() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        let confirmation = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana lopez", "12345678"))
            .unwrap();

        assert_eq!(confirmation.reservation.status, ReservationStatus::Active);
        assert_eq!(confirmation.ticket.reservation_id, confirmation.reservation.id);
        assert_eq!(engine.seat(&seat_id).unwrap().status(), SeatStatus::Held);
    }

    #[test]
    fn test_cabin_pricing_applied() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();

        let economy = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;
        let business = engine.seat_by_number(&aircraft_id, "1A").unwrap().id;

        let first = engine
            .create_reservation(&flight_id, &economy, &passenger_form("ana", "12345678"))
            .unwrap();
        assert_eq!(first.reservation.price_cents, 10_000);

        let second = engine
            .create_reservation(&flight_id, &business, &passenger_form("juan", "87654321"))
            .unwrap();
        assert_eq!(second.reservation.price_cents, 20_000);
    }

    #[test]
    fn test_same_seat_second_caller_loses() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();

        let err = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("juan", "87654321"))
            .unwrap_err();
        assert!(matches!(err, CoreError::SeatUnavailableError(_)));

        // The loser left no trace: no reservation, no passenger hold.
        assert_eq!(engine.seat(&seat_id).unwrap().status(), SeatStatus::Held);
    }

    #[test]
    fn test_duplicate_passenger_on_flight_rejected() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();

        let first_seat = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;
        let second_seat = engine.seat_by_number(&aircraft_id, "12B").unwrap().id;

        engine
            .create_reservation(&flight_id, &first_seat, &passenger_form("ana", "12345678"))
            .unwrap();

        let err = engine
            .create_reservation(&flight_id, &second_seat, &passenger_form("ana", "12345678"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateReservationError(_)));

        // The second seat was never touched.
        assert_eq!(
            engine.seat(&second_seat).unwrap().status(),
            SeatStatus::Available
        );
    }

    #[test]
    fn test_cancellation_releases_seat_and_voids_ticket() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        let confirmation = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();
        let reservation_id = confirmation.reservation.id;

        let outcome = engine.cancel_reservation(&reservation_id).unwrap();
        assert_eq!(outcome, CancellationOutcome::Cancelled);
        assert_eq!(
            engine.seat(&seat_id).unwrap().status(),
            SeatStatus::Available
        );
        assert_eq!(
            engine.ticket_for(&reservation_id).unwrap().status,
            crate::ticket::TicketStatus::Voided
        );

        // Second cancel reports the state without freeing anything twice.
        let outcome = engine.cancel_reservation(&reservation_id).unwrap();
        assert_eq!(outcome, CancellationOutcome::AlreadyCancelled);
        assert_eq!(
            engine.seat(&seat_id).unwrap().status(),
            SeatStatus::Available
        );
    }

    #[test]
    fn test_cancelled_seat_can_be_rebooked() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        let confirmation = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();
        engine.cancel_reservation(&confirmation.reservation.id).unwrap();

        // Same passenger, same flight, fresh reservation.
        engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();
    }

    #[test]
    fn test_lookup_by_code() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        let confirmation = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();

        let code = confirmation.reservation.confirmation_code.to_string();
        let found = engine.lookup_by_code(&code).unwrap();
        assert_eq!(found.id, confirmation.reservation.id);

        // Malformed and unknown codes are both plain misses.
        assert!(matches!(
            engine.lookup_by_code("definitely-not-a-code").unwrap_err(),
            CoreError::NotFoundError(_)
        ));
        assert!(matches!(
            engine.lookup_by_code(&Uuid::new_v4().to_string()).unwrap_err(),
            CoreError::NotFoundError(_)
        ));
    }

    #[test]
    fn test_occupancy_counts() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();

        let occupancy = engine.flight_occupancy(&flight_id).unwrap();
        assert_eq!(occupancy.total, 72);
        assert_eq!(occupancy.available, 72);
        assert_eq!(occupancy.percent, 0.0);

        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;
        engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();

        let occupancy = engine.flight_occupancy(&flight_id).unwrap();
        assert_eq!(occupancy.available, 71);
        assert_eq!(occupancy.by_cabin[&CabinClass::Economy], 35);
        assert_eq!(occupancy.by_cabin[&CabinClass::Business], 12);
        assert_eq!(occupancy.by_cabin[&CabinClass::Premium], 24);
        assert!((occupancy.percent - 100.0 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_seat_must_match_flight_aircraft() {
        let (mut engine, _aircraft_id, flight_id) = engine_with_flight();

        let other_aircraft = engine.register_aircraft("E190", 48, 12, 4).unwrap();
        let foreign_seat = engine.seat_by_number(&other_aircraft, "1A").unwrap().id;

        let err = engine
            .create_reservation(&flight_id, &foreign_seat, &passenger_form("ana", "12345678"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_retire_aircraft_cascades() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        let confirmation = engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();

        engine.retire_aircraft(&aircraft_id).unwrap();

        assert!(engine.aircraft(&aircraft_id).is_none());
        assert!(engine.flight(&flight_id).is_none());
        assert!(engine.seat(&seat_id).is_none());
        assert!(engine.reservation(&confirmation.reservation.id).is_none());
        assert!(engine.ticket_for(&confirmation.reservation.id).is_none());
        assert!(engine
            .lookup_by_code(&confirmation.reservation.confirmation_code.to_string())
            .is_err());
    }

    #[test]
    fn test_cabin_reshape_blocked_while_held() {
        let (mut engine, aircraft_id, flight_id) = engine_with_flight();
        let seat_id = engine.seat_by_number(&aircraft_id, "12A").unwrap().id;

        engine
            .create_reservation(&flight_id, &seat_id, &passenger_form("ana", "12345678"))
            .unwrap();

        let err = engine
            .update_aircraft(aircraft_id, "A320", 48, 12, 4)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        // A rename that keeps the geometry is fine.
        engine
            .update_aircraft(aircraft_id, "A320neo", 72, 12, 6)
            .unwrap();
    }
}
