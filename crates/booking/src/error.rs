use thiserror::Error;

/// Failure outcomes of the booking operations.
///
/// Every variant is reported to the caller as-is; none of them leave the store
/// partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("no seats available")]
    NoSeatsAvailable,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("seat unavailable: {0}")]
    SeatUnavailable(String),

    #[error("train not found: {0}")]
    TrainNotFound(String),
}

impl BookingError {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::InvalidDiscount(_) => "invalid_discount",
            BookingError::NoSeatsAvailable => "no_seats_available",
            BookingError::UserNotFound(_) => "user_not_found",
            BookingError::SectionNotFound(_) => "section_not_found",
            BookingError::ReceiptNotFound(_) => "receipt_not_found",
            BookingError::AlreadyCancelled(_) => "already_cancelled",
            BookingError::SeatUnavailable(_) => "seat_unavailable",
            BookingError::TrainNotFound(_) => "train_not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
