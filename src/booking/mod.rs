//! Reservation validation, conflict detection and the create/update/delete lifecycle.

mod conflict;
mod error;
mod service;
mod validate;

pub use conflict::check_conflict;
pub use error::{BookingError, ConflictInfo};
pub use service::BookingService;
pub use validate::{is_valid_date, validate};
