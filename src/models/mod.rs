pub mod reservation;
pub mod user;

pub use reservation::{NewReservation, Reservation, ReservationRequest};
pub use user::User;
