use crate::models::{NewReservation, Reservation};

/// Half-open windows `[start_a, end_a)` and `[start_b, end_b)` overlap iff each starts
/// before the other ends. Operands are zero-padded `HH:MM`, so string order is time order.
pub fn overlaps(start_a: &str, end_a: &str, start_b: &str, end_b: &str) -> bool {
    start_a < end_b && start_b < end_a
}

/// First reservation in `existing` whose window overlaps the candidate, skipping
/// `exclude_id`. `existing` must already be narrowed to the candidate's room and date.
pub fn check_conflict<'a>(
    existing: &'a [Reservation],
    candidate: &NewReservation,
    exclude_id: Option<i64>,
) -> Option<&'a Reservation> {
    existing
        .iter()
        .filter(|r| Some(r.id) != exclude_id)
        .find(|r| overlaps(&r.start_time, &r.end_time, &candidate.start_time, &candidate.end_time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, start: &str, end: &str) -> Reservation {
        Reservation {
            id,
            email: "owner@example.com".to_string(),
            room: "Conference Room".to_string(),
            date: "2025-03-04".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            users_involved: Vec::new(),
            created_at: 0,
        }
    }

    fn candidate(start: &str, end: &str) -> NewReservation {
        NewReservation {
            email: "someone@example.com".to_string(),
            room: "Conference Room".to_string(),
            date: "2025-03-04".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            users_involved: Vec::new(),
        }
    }

    fn hhmm(minutes: u32) -> String {
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    #[test]
    fn test_touching_windows_do_not_conflict() {
        let existing = vec![stored(1, "09:00", "10:00")];
        assert!(check_conflict(&existing, &candidate("10:00", "11:00"), None).is_none());
        assert!(check_conflict(&existing, &candidate("08:00", "09:00"), None).is_none());
    }

    #[test]
    fn test_contained_window_conflicts() {
        let existing = vec![stored(1, "09:00", "10:00")];
        let hit = check_conflict(&existing, &candidate("09:30", "09:45"), None);
        assert_eq!(hit.map(|r| r.id), Some(1));
    }

    #[test]
    fn test_containing_window_conflicts() {
        let existing = vec![stored(1, "09:30", "09:45")];
        assert!(check_conflict(&existing, &candidate("09:00", "10:00"), None).is_some());
    }

    #[test]
    fn test_partial_overlap_at_edge_conflicts() {
        let existing = vec![stored(1, "09:00", "10:00")];
        assert!(check_conflict(&existing, &candidate("08:00", "09:01"), None).is_some());
        assert!(check_conflict(&existing, &candidate("09:59", "11:00"), None).is_some());
    }

    #[test]
    fn test_identical_window_conflicts() {
        let existing = vec![stored(1, "09:00", "10:00")];
        assert!(check_conflict(&existing, &candidate("09:00", "10:00"), None).is_some());
    }

    #[test]
    fn test_excluded_id_is_skipped() {
        let existing = vec![stored(1, "09:00", "10:00"), stored(2, "10:00", "11:00")];
        assert!(check_conflict(&existing, &candidate("09:00", "10:00"), Some(1)).is_none());
        let hit = check_conflict(&existing, &candidate("09:30", "10:30"), Some(1));
        assert_eq!(hit.map(|r| r.id), Some(2));
    }

    #[test]
    fn test_returns_first_blocking_reservation() {
        let existing = vec![
            stored(1, "08:00", "08:30"),
            stored(2, "09:00", "10:00"),
            stored(3, "10:00", "11:00"),
        ];
        let hit = check_conflict(&existing, &candidate("09:30", "10:30"), None);
        assert_eq!(hit.map(|r| r.id), Some(2));
    }

    #[test]
    fn test_empty_day_accepts() {
        assert!(check_conflict(&[], &candidate("00:00", "23:59"), None).is_none());
    }

    /// Compares the string predicate against minute-by-minute occupancy for every
    /// pair of quarter-hour windows in a morning.
    #[test]
    fn test_predicate_matches_minute_occupancy() {
        let slots: Vec<u32> = (8 * 60..=12 * 60).step_by(15).collect();
        for &s1 in &slots {
            for &e1 in slots.iter().filter(|&&e| e > s1) {
                for &s2 in &slots {
                    for &e2 in slots.iter().filter(|&&e| e > s2) {
                        let shares_minute = (s1..e1).any(|m| (s2..e2).contains(&m));
                        assert_eq!(
                            overlaps(&hhmm(s1), &hhmm(e1), &hhmm(s2), &hhmm(e2)),
                            shares_minute,
                            "[{}, {}) vs [{}, {})",
                            hhmm(s1), hhmm(e1), hhmm(s2), hhmm(e2)
                        );
                    }
                }
            }
        }
    }
}
