use boxoffice_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// Existence, ownership or status precondition did not hold
    #[error("Seat not found: {0}")]
    NotFound(String),

    /// A concurrent writer won, or a lease could not be taken or given back
    #[error("Seat update conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Unavailable(#[from] StoreError),

    #[error("Unknown reservation strategy: {0}")]
    UnknownStrategy(String),
}

impl ReservationError {
    /// Only lost races are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReservationError::Conflict(_))
    }

    /// HTTP status the API layer reports for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            ReservationError::NotFound(_) => 404,
            ReservationError::Conflict(_) => 409,
            ReservationError::Unavailable(_) => 503,
            ReservationError::UnknownStrategy(_) => 400,
        }
    }
}

pub type ReservationResult<T> = Result<T, ReservationError>;
