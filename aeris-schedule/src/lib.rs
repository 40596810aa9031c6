pub mod flight;
pub mod repository;
pub mod scheduler;

pub use flight::{Flight, FlightStatus};
pub use repository::FlightRepository;
pub use scheduler::{FlightSchedule, ScheduleRequest};
