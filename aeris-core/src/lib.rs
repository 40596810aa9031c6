pub mod document;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Schedule conflict: {0}")]
    ConflictError(String),
    #[error("Seat unavailable: {0}")]
    SeatUnavailableError(String),
    #[error("Duplicate reservation: {0}")]
    DuplicateReservationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
