use aeris_core::CoreResult;
use aeris_fleet::seatmap::{CabinClass, Seat};
use async_trait::async_trait;
use uuid::Uuid;

use crate::engine::{BookingConfirmation, FlightOccupancy};
use crate::passenger::PassengerForm;
use crate::reservation::Reservation;

/// Data-access seam for the reservation lifecycle. Implementations must
/// make `create_reservation` atomic: the seat status re-check, the
/// uniqueness checks, and every write commit together or not at all.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Available seats on the flight's aircraft, ordered by (row, column).
    async fn list_available_seats(
        &self,
        flight_id: Uuid,
        cabin: Option<CabinClass>,
    ) -> CoreResult<Vec<Seat>>;

    async fn create_reservation(
        &self,
        flight_id: Uuid,
        seat_id: Uuid,
        form: &PassengerForm,
    ) -> CoreResult<BookingConfirmation>;

    /// Idempotent: cancelling an already-cancelled reservation succeeds
    /// without releasing the seat a second time.
    async fn cancel_reservation(&self, id: Uuid) -> CoreResult<()>;

    /// Confirmation-code lookup; malformed codes are reported as misses.
    async fn find_by_code(&self, code: &str) -> CoreResult<Reservation>;

    async fn flight_occupancy(&self, flight_id: Uuid) -> CoreResult<FlightOccupancy>;
}
