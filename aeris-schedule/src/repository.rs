use aeris_core::CoreResult;
use async_trait::async_trait;
use uuid::Uuid;

use crate::flight::{Flight, FlightStatus};
use crate::scheduler::ScheduleRequest;

/// Data-access seam for the flight board.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Validate, reject aircraft double-booking, and persist.
    async fn schedule_flight(&self, request: ScheduleRequest) -> CoreResult<Flight>;

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    async fn list_by_aircraft(&self, aircraft_id: Uuid) -> CoreResult<Vec<Flight>>;

    async fn set_status(&self, id: Uuid, status: FlightStatus) -> CoreResult<()>;
}
