use crate::models::user::normalize_email;
use crate::models::{NewReservation, ReservationRequest};
use chrono::{NaiveDate, NaiveTime};

use super::BookingError;

/// `d` marks an ASCII digit, anything else must match literally.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value.bytes().zip(shape.bytes()).all(|(v, s)| match s {
            b'd' => v.is_ascii_digit(),
            other => v == other,
        })
}

/// Strict `YYYY-MM-DD`. Fixed width keeps lexical order equal to calendar order.
pub fn is_valid_date(value: &str) -> bool {
    matches_shape(value, "dddd-dd-dd") && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Strict zero-padded 24-hour `HH:MM`.
pub fn is_valid_time(value: &str) -> bool {
    matches_shape(value, "dd:dd") && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercases participants, drops blanks and repeated addresses, keeps first-seen order.
fn normalize_participants(users: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(users.len());
    for user in users {
        let user = normalize_email(&user);
        if !user.is_empty() && !seen.contains(&user) {
            seen.push(user);
        }
    }
    seen
}

/// Turns a raw request into a `NewReservation`, or explains why it cannot be booked.
pub fn validate(request: ReservationRequest) -> Result<NewReservation, BookingError> {
    let (Some(email), Some(room), Some(date), Some(start_time), Some(end_time), Some(users_involved)) = (
        required(request.email),
        required(request.room),
        required(request.date),
        required(request.start_time),
        required(request.end_time),
        request.users_involved,
    ) else {
        return Err(BookingError::validation("Missing required fields"));
    };

    if !is_valid_date(&date) {
        return Err(BookingError::validation(format!("Invalid date '{date}', expected YYYY-MM-DD")));
    }
    for time in [&start_time, &end_time] {
        if !is_valid_time(time) {
            return Err(BookingError::validation(format!("Invalid time '{time}', expected HH:MM")));
        }
    }
    if start_time >= end_time {
        return Err(BookingError::validation("Start time must be before end time"));
    }

    Ok(NewReservation {
        email: normalize_email(&email),
        room,
        date,
        start_time,
        end_time,
        users_involved: normalize_participants(users_involved),
    })
}
