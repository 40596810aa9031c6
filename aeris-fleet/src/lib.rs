pub mod aircraft;
pub mod repository;
pub mod seatmap;

pub use aircraft::{Aircraft, AircraftRegistry};
pub use repository::FleetRepository;
pub use seatmap::{CabinClass, CabinLayout, Seat, SeatInventory, SeatStatus};
