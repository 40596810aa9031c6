use aeris_core::CoreResult;
use async_trait::async_trait;
use uuid::Uuid;

use crate::aircraft::Aircraft;
use crate::seatmap::{CabinClass, CabinLayout, Seat};

/// Data-access seam for aircraft and their seat maps.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Persist (create or update) an aircraft, provisioning its seat map
    /// on first save.
    async fn save_aircraft(&self, aircraft: &Aircraft, layout: &CabinLayout) -> CoreResult<Uuid>;

    async fn get_aircraft(&self, id: Uuid) -> CoreResult<Option<Aircraft>>;

    /// Remove an aircraft; seats, flights, and their reservations go with it.
    async fn delete_aircraft(&self, id: Uuid) -> CoreResult<()>;

    /// Available seats ordered by (row, column).
    async fn available_seats(
        &self,
        aircraft_id: Uuid,
        cabin: Option<CabinClass>,
    ) -> CoreResult<Vec<Seat>>;
}
