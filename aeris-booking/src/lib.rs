pub mod engine;
pub mod fares;
pub mod passenger;
pub mod repository;
pub mod reservation;
pub mod ticket;

pub use engine::{BookingConfirmation, CancellationOutcome, FlightOccupancy, ReservationEngine};
pub use fares::FarePolicy;
pub use passenger::{Passenger, PassengerDirectory, PassengerForm};
pub use repository::ReservationRepository;
pub use reservation::{Reservation, ReservationStatus};
pub use ticket::{Ticket, TicketService, TicketStatus};
