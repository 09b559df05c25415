use crate::models::{NewReservation, Reservation};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

/// Row shape of the `reservations` table. Participants are stored as a JSON array.
#[derive(FromRow)]
struct ReservationRow {
    id: i64,
    email: String,
    room: String,
    date: String,
    start_time: String,
    end_time: String,
    users_involved: String,
    created_at: i64,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = sqlx::Error;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let users_involved = serde_json::from_str(&row.users_involved)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Reservation {
            id: row.id,
            email: row.email,
            room: row.room,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            users_involved,
            created_at: row.created_at,
        })
    }
}

fn into_reservations(rows: Vec<ReservationRow>) -> Result<Vec<Reservation>, sqlx::Error> {
    rows.into_iter().map(Reservation::try_from).collect()
}

fn encode_participants(users: &[String]) -> Result<String, sqlx::Error> {
    serde_json::to_string(users).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Reservation>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// All reservations on a date across rooms, earliest first.
    pub async fn get_by_date(&self, date: &str) -> Result<Vec<Reservation>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE date = ? ORDER BY start_time, room",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        into_reservations(rows)
    }

    /// Returns false when no row had that id.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // The functions below run on a caller-held connection so that the slot read and
    // the write share one transaction.

    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: i64) -> Result<Option<Reservation>, sqlx::Error> {
        let row = sqlx::query_as::<_, ReservationRow>("SELECT * FROM reservations WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(Reservation::try_from).transpose()
    }

    pub async fn get_by_room_and_date(
        conn: &mut SqliteConnection,
        room: &str,
        date: &str,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE room = ? AND date = ? ORDER BY start_time",
        )
        .bind(room)
        .bind(date)
        .fetch_all(&mut *conn)
        .await?;
        into_reservations(rows)
    }

    /// Inserts and returns the new row id.
    pub async fn insert(conn: &mut SqliteConnection, new: &NewReservation, created_at: i64) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO reservations (email, room, date, start_time, end_time, users_involved, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.email)
        .bind(&new.room)
        .bind(&new.date)
        .bind(&new.start_time)
        .bind(&new.end_time)
        .bind(encode_participants(&new.users_involved)?)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrites every mutable field. `created_at` is left alone.
    pub async fn update(conn: &mut SqliteConnection, id: i64, new: &NewReservation) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reservations
             SET email = ?, room = ?, date = ?, start_time = ?, end_time = ?, users_involved = ?
             WHERE id = ?",
        )
        .bind(&new.email)
        .bind(&new.room)
        .bind(&new.date)
        .bind(&new.start_time)
        .bind(&new.end_time)
        .bind(encode_participants(&new.users_involved)?)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
