use serde::{Deserialize, Serialize};

/// A committed booking of a room for a `[start_time, end_time)` window on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub email: String,
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub users_involved: Vec<String>,
    pub created_at: i64,
}

impl Reservation {
    /// Both sides are already lowercased, see `normalize_email`.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email == email
    }
}

/// Booking payload as submitted by a client. Every field is optional here so that
/// a missing field surfaces as a validation error instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub email: Option<String>,
    pub room: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub users_involved: Option<Vec<String>>,
}

/// A request that passed validation and is ready for the conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub email: String,
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub users_involved: Vec<String>,
}

impl NewReservation {
    pub fn into_reservation(self, id: i64, created_at: i64) -> Reservation {
        Reservation {
            id,
            email: self.email,
            room: self.room,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            users_involved: self.users_involved,
            created_at,
        }
    }
}
