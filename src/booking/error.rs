use crate::models::Reservation;
use thiserror::Error;

/// Identifies the reservation that blocked a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub id: i64,
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<&Reservation> for ConflictInfo {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            room: r.room.clone(),
            date: r.date.clone(),
            start_time: r.start_time.clone(),
            end_time: r.end_time.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error(
        "Booking conflict: {} is already booked {}-{} on {}",
        .0.room, .0.start_time, .0.end_time, .0.date
    )]
    Conflict(ConflictInfo),

    #[error("Booking not found: {0}")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl BookingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BookingError::Validation(msg.into())
    }
}
