use crate::db::reservation::ReservationRepository;
use crate::models::{Reservation, ReservationRequest};
use sqlx::SqlitePool;

use super::{check_conflict, is_valid_date, validate, BookingError, ConflictInfo};

/// Runs every reservation write through validation and the conflict check.
///
/// The slot read and the write share one transaction, so a request either commits
/// against the slot it checked or not at all.
pub struct BookingService {
    repo: ReservationRepository,
}

impl BookingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: ReservationRepository::new(pool),
        }
    }

    pub async fn create_reservation(&self, request: ReservationRequest) -> Result<Reservation, BookingError> {
        let candidate = validate(request).inspect_err(|e| tracing::debug!("Rejected booking request: {}", e))?;

        let mut tx = self.repo.pool().begin().await?;
        let existing = ReservationRepository::get_by_room_and_date(&mut tx, &candidate.room, &candidate.date).await?;

        if let Some(blocking) = check_conflict(&existing, &candidate, None) {
            tracing::info!(
                "Rejected booking of {} on {} {}-{} by {}: overlaps reservation {}",
                candidate.room, candidate.date, candidate.start_time, candidate.end_time,
                candidate.email, blocking.id
            );
            return Err(BookingError::Conflict(ConflictInfo::from(blocking)));
        }

        let created_at = chrono::Utc::now().timestamp();
        let id = ReservationRepository::insert(&mut tx, &candidate, created_at).await?;
        tx.commit().await?;

        tracing::info!(
            "Committed reservation {}: {} on {} {}-{} for {}",
            id, candidate.room, candidate.date, candidate.start_time, candidate.end_time, candidate.email
        );
        Ok(candidate.into_reservation(id, created_at))
    }

    /// Replaces room, date, window, owner and participants of an existing reservation.
    /// The reservation never conflicts with itself.
    pub async fn update_reservation(&self, id: i64, request: ReservationRequest) -> Result<Reservation, BookingError> {
        let candidate = validate(request).inspect_err(|e| tracing::debug!("Rejected edit of reservation {}: {}", id, e))?;

        let mut tx = self.repo.pool().begin().await?;
        let current = ReservationRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        let existing = ReservationRepository::get_by_room_and_date(&mut tx, &candidate.room, &candidate.date).await?;
        if let Some(blocking) = check_conflict(&existing, &candidate, Some(id)) {
            tracing::info!(
                "Rejected edit of reservation {} to {} on {} {}-{}: overlaps reservation {}",
                id, candidate.room, candidate.date, candidate.start_time, candidate.end_time, blocking.id
            );
            return Err(BookingError::Conflict(ConflictInfo::from(blocking)));
        }

        if !ReservationRepository::update(&mut tx, id, &candidate).await? {
            return Err(BookingError::NotFound(id));
        }
        tx.commit().await?;

        tracing::info!(
            "Edited reservation {}: {} on {} {}-{}",
            id, candidate.room, candidate.date, candidate.start_time, candidate.end_time
        );
        Ok(candidate.into_reservation(id, current.created_at))
    }

    /// Deleting an id that is already gone is `NotFound`, not a no-op.
    pub async fn delete_reservation(&self, id: i64) -> Result<(), BookingError> {
        if !self.repo.delete(id).await? {
            return Err(BookingError::NotFound(id));
        }
        tracing::info!("Deleted reservation {}", id);
        Ok(())
    }

    pub async fn get_reservation(&self, id: i64) -> Result<Reservation, BookingError> {
        self.repo.get_by_id(id).await?.ok_or(BookingError::NotFound(id))
    }

    /// Reservations on `date` across all rooms, earliest first.
    pub async fn list_for_date(&self, date: &str) -> Result<Vec<Reservation>, BookingError> {
        if !is_valid_date(date) {
            return Err(BookingError::validation(format!("Invalid date '{date}', expected YYYY-MM-DD")));
        }
        Ok(self.repo.get_by_date(date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    const ROOM: &str = "Conference Room";
    const DAY: &str = "2025-03-04";

    fn request(room: &str, date: &str, start: &str, end: &str) -> ReservationRequest {
        ReservationRequest {
            email: Some("owner@example.com".to_string()),
            room: Some(room.to_string()),
            date: Some(date.to_string()),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            users_involved: Some(vec!["guest@example.com".to_string()]),
        }
    }

    async fn service() -> BookingService {
        BookingService::new(test_pool().await)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let svc = service().await;
        let created = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        assert!(created.id > 0);

        let fetched = svc.get_reservation(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_touching_booking_accepted() {
        let svc = service().await;
        svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        svc.create_reservation(request(ROOM, DAY, "10:00", "11:00")).await.unwrap();
        assert_eq!(svc.list_for_date(DAY).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contained_booking_rejected() {
        let svc = service().await;
        let first = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();

        let err = svc.create_reservation(request(ROOM, DAY, "09:30", "09:45")).await.unwrap_err();
        match err {
            BookingError::Conflict(info) => {
                assert_eq!(info.id, first.id);
                assert_eq!(info.start_time, "09:00");
                assert_eq!(info.end_time, "10:00");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(svc.list_for_date(DAY).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edge_overlap_rejected() {
        let svc = service().await;
        svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        let result = svc.create_reservation(request(ROOM, DAY, "08:00", "09:01")).await;
        assert!(matches!(result, Err(BookingError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_other_room_or_date_does_not_conflict() {
        let svc = service().await;
        svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        svc.create_reservation(request("Focus Room", DAY, "09:00", "10:00")).await.unwrap();
        svc.create_reservation(request(ROOM, "2025-03-05", "09:00", "10:00")).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_length_rejected_on_empty_day() {
        let svc = service().await;
        let result = svc.create_reservation(request(ROOM, DAY, "09:00", "09:00")).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(svc.list_for_date(DAY).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_participants_does_not_conflict_with_self() {
        let svc = service().await;
        let created = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();

        let mut edit = request(ROOM, DAY, "09:00", "10:00");
        edit.users_involved = Some(vec!["x@example.com".to_string(), "y@example.com".to_string()]);
        let updated = svc.update_reservation(created.id, edit).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.users_involved, vec!["x@example.com", "y@example.com"]);
        assert_eq!(svc.get_reservation(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_into_other_booking_rejected() {
        let svc = service().await;
        let first = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        let second = svc.create_reservation(request(ROOM, DAY, "11:00", "12:00")).await.unwrap();

        let result = svc.update_reservation(second.id, request(ROOM, DAY, "09:30", "11:30")).await;
        match result {
            Err(BookingError::Conflict(info)) => assert_eq!(info.id, first.id),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(svc.get_reservation(second.id).await.unwrap().start_time, "11:00");
    }

    #[tokio::test]
    async fn test_update_missing_reservation() {
        let svc = service().await;
        let result = svc.update_reservation(999, request(ROOM, DAY, "09:00", "10:00")).await;
        assert!(matches!(result, Err(BookingError::NotFound(999))));
    }

    #[tokio::test]
    async fn test_update_validates_first() {
        let svc = service().await;
        let created = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        let result = svc.update_reservation(created.id, request(ROOM, DAY, "10:00", "09:00")).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let svc = service().await;
        let created = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();

        svc.delete_reservation(created.id).await.unwrap();
        let again = svc.delete_reservation(created.id).await;
        assert!(matches!(again, Err(BookingError::NotFound(id)) if id == created.id));
        assert!(matches!(svc.get_reservation(created.id).await, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deleted_slot_can_be_rebooked() {
        let svc = service().await;
        let created = svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
        svc.delete_reservation(created.id).await.unwrap();
        svc.create_reservation(request(ROOM, DAY, "09:00", "10:00")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_for_date_rejects_bad_date() {
        let svc = service().await;
        assert!(matches!(svc.list_for_date("tomorrow").await, Err(BookingError::Validation(_))));
    }

    async fn file_pool(name: &str) -> SqlitePool {
        let dir = std::env::temp_dir().join("roombook_test_service");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }

        let pool = crate::db::create_pool(&format!("sqlite://{}", path.display())).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_requests_commit_once() {
        let pool = file_pool("concurrent_overlap.db").await;
        let svc = std::sync::Arc::new(BookingService::new(pool.clone()));

        let n = 16;
        let mut handles = Vec::new();
        for i in 0..n {
            let svc = svc.clone();
            // Every window covers 09:30-10:00
            let start = format!("09:{:02}", i);
            handles.push(tokio::spawn(async move {
                svc.create_reservation(request(ROOM, DAY, &start, "10:00")).await
            }));
        }

        let mut committed = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => committed += 1,
                Err(BookingError::Conflict(_)) | Err(BookingError::Persistence(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(committed, 1);
        let stored = BookingService::new(pool).list_for_date(DAY).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    /// Accepting a booking must match the overlap predicate against what was stored so far.
    #[tokio::test]
    async fn test_acceptance_matches_predicate() {
        let svc = service().await;
        let windows = [
            ("09:00", "10:00"),
            ("09:30", "10:30"),
            ("10:00", "10:15"),
            ("08:00", "12:00"),
            ("10:15", "11:00"),
            ("10:59", "11:01"),
            ("11:00", "11:30"),
        ];
        let mut accepted: Vec<(&str, &str)> = Vec::new();

        for (start, end) in windows {
            let expected = !accepted
                .iter()
                .any(|(s, e)| super::super::conflict::overlaps(s, e, start, end));
            let result = svc.create_reservation(request(ROOM, DAY, start, end)).await;
            assert_eq!(result.is_ok(), expected, "{start}-{end}");
            if expected {
                accepted.push((start, end));
            }
        }
        assert_eq!(accepted, vec![("09:00", "10:00"), ("10:00", "10:15"), ("10:15", "11:00"), ("11:00", "11:30")]);
    }
}
