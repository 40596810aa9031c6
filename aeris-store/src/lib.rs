pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod fleet_repo;
pub mod flight_repo;

pub use app_config::Config;
pub use booking_repo::PgReservationRepository;
pub use database::DbClient;
pub use fleet_repo::PgFleetRepository;
pub use flight_repo::PgFlightRepository;

use aeris_core::CoreError;

pub(crate) fn store_err(err: sqlx::Error) -> CoreError {
    CoreError::InternalError(err.to_string())
}
