use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, Postgres, Transaction};

use super::{Store, StoreTx};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::{
    Booking, Movie, NewMovie, NewUser, Payment, PaymentStatus, ScheduledShowtime, Seat, Showtime, User, UserRole,
};

// Строки с текстовыми enum-колонками разбираем вручную
#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    booking_id: i64,
    amount: f64,
    status: String,
    payment_date: NaiveDateTime,
    payment_method: String,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            status: row.status.parse().map_err(Error::Store)?,
            payment_date: row.payment_date,
            payment_method: row.payment_method,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse::<UserRole>().map_err(Error::Store)?,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Хранилище поверх пула PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.db.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn movie(&self, id: i64) -> Result<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, duration_minutes, synopsis FROM movie WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(movie)
    }

    async fn movies(&self) -> Result<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, duration_minutes, synopsis FROM movie ORDER BY title",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(movies)
    }

    async fn movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, duration_minutes, synopsis FROM movie WHERE title = $1 ORDER BY id LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(movie)
    }

    async fn showtime(&self, id: i64) -> Result<Option<Showtime>> {
        let showtime = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, start_datetime, hall FROM showtime WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(showtime)
    }

    async fn showtimes(&self) -> Result<Vec<Showtime>> {
        let showtimes = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, start_datetime, hall FROM showtime ORDER BY start_datetime, id",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn showtimes_for_movie(&self, movie_id: i64, date: Option<NaiveDate>) -> Result<Vec<Showtime>> {
        let showtimes = sqlx::query_as::<_, Showtime>(
            r#"
            SELECT id, movie_id, start_datetime, hall
            FROM showtime
            WHERE movie_id = $1
              AND ($2::date IS NULL OR start_datetime::date = $2::date)
            ORDER BY start_datetime
            "#,
        )
        .bind(movie_id)
        .bind(date)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn showtimes_in_hall(&self, hall: &str) -> Result<Vec<ScheduledShowtime>> {
        let showtimes = sqlx::query_as::<_, ScheduledShowtime>(
            r#"
            SELECT s.id, s.movie_id, s.start_datetime, s.hall, m.title, m.duration_minutes
            FROM showtime s
            JOIN movie m ON m.id = s.movie_id
            WHERE s.hall = $1
            ORDER BY s.start_datetime
            "#,
        )
        .bind(hall)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn showtimes_before(&self, cutoff: NaiveDateTime) -> Result<Vec<Showtime>> {
        let showtimes = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, start_datetime, hall FROM showtime WHERE start_datetime < $1 ORDER BY start_datetime",
        )
        .bind(cutoff)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn seat(&self, id: i64) -> Result<Option<Seat>> {
        let seat = sqlx::query_as::<_, Seat>(
            "SELECT id, showtime_id, seat_number, is_booked FROM seat WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(seat)
    }

    async fn seats_for_showtime(&self, showtime_id: i64) -> Result<Vec<Seat>> {
        // Сортировка по ряду (длина метки, затем метка) и по номеру, чтобы B10 шло после B9
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, showtime_id, seat_number, is_booked
            FROM seat
            WHERE showtime_id = $1
            ORDER BY length(substring(seat_number from '^[A-Z]+')),
                     substring(seat_number from '^[A-Z]+'),
                     substring(seat_number from '[0-9]+$')::int
            "#,
        )
        .bind(showtime_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(seats)
    }

    async fn booking(&self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, movie_id, showtime_id, is_paid FROM booking WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(booking)
    }

    async fn seat_ids_for_booking(&self, booking_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT seat_id FROM booking_seat WHERE booking_id = $1 ORDER BY seat_id",
        )
        .bind(booking_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(ids)
    }

    async fn payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, amount, status, payment_date, payment_method
            FROM payment
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.db.pool)
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role FROM app_user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db.pool)
        .await?;
        row.map(User::try_from).transpose()
    }
}

/// Транзакция PostgreSQL. sqlx откатывает её сам, если она не была закоммичена.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    async fn execute(&mut self, sql: &str, id: i64) -> Result<u64> {
        let result = sqlx::query(sql).bind(id).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_movie(&mut self, movie: &NewMovie) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO movie (title, genre, duration_minutes, synopsis)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(movie.duration_minutes)
        .bind(&movie.synopsis)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<i64> {
        let res = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO app_user (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&mut *self.tx)
        .await;

        match res {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::conflict(format!("email {} is already registered", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_showtime(&mut self, movie_id: i64, start: NaiveDateTime, hall: &str) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO showtime (movie_id, start_datetime, hall) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(movie_id)
        .bind(start)
        .bind(hall)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn showtime(&mut self, id: i64) -> Result<Option<Showtime>> {
        let showtime = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, start_datetime, hall FROM showtime WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(showtime)
    }

    async fn delete_seats_for_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.execute("DELETE FROM seat WHERE showtime_id = $1", showtime_id).await
    }

    async fn insert_seats(&mut self, showtime_id: i64, seat_numbers: &[String]) -> Result<u64> {
        // Одна пачка через UNNEST вместо rows*cols отдельных INSERT
        let result = sqlx::query(
            r#"
            INSERT INTO seat (showtime_id, seat_number, is_booked)
            SELECT $1, n, false FROM UNNEST($2::text[]) AS n
            "#,
        )
        .bind(showtime_id)
        .bind(seat_numbers)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn seat(&mut self, id: i64) -> Result<Option<Seat>> {
        let seat = sqlx::query_as::<_, Seat>(
            "SELECT id, showtime_id, seat_number, is_booked FROM seat WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(seat)
    }

    async fn set_seat_booked(&mut self, seat_id: i64, booked: bool) -> Result<u64> {
        let result = sqlx::query("UPDATE seat SET is_booked = $1 WHERE id = $2")
            .bind(booked)
            .bind(seat_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn claim_seat(&mut self, seat_id: i64) -> Result<u64> {
        self.execute("UPDATE seat SET is_booked = true WHERE id = $1 AND is_booked = false", seat_id)
            .await
    }

    async fn release_seat_if_unlinked(&mut self, seat_id: i64) -> Result<u64> {
        self.execute(
            r#"
            UPDATE seat SET is_booked = false
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM booking_seat WHERE seat_id = $1)
            "#,
            seat_id,
        )
        .await
    }

    async fn booking(&mut self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, movie_id, showtime_id, is_paid FROM booking WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(booking)
    }

    async fn insert_booking(&mut self, user_id: i64, movie_id: i64, showtime_id: i64) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO booking (user_id, movie_id, showtime_id, is_paid)
            VALUES ($1, $2, $3, false)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(showtime_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn link_seat(&mut self, booking_id: i64, seat_id: i64) -> Result<()> {
        let res = sqlx::query("INSERT INTO booking_seat (booking_id, seat_id) VALUES ($1, $2)")
            .bind(booking_id)
            .bind(seat_id)
            .execute(&mut *self.tx)
            .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::conflict(format!("seat {} is already reserved", seat_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn is_seat_linked(&mut self, booking_id: i64, seat_id: i64) -> Result<bool> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM booking_seat WHERE booking_id = $1 AND seat_id = $2)",
        )
        .bind(booking_id)
        .bind(seat_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(linked)
    }

    async fn set_booking_paid(&mut self, booking_id: i64, paid: bool) -> Result<u64> {
        let result = sqlx::query("UPDATE booking SET is_paid = $1 WHERE id = $2")
            .bind(paid)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_booking_seats_for_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.execute("DELETE FROM booking_seat WHERE booking_id = $1", booking_id).await
    }

    async fn delete_payments_for_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.execute("DELETE FROM payment WHERE booking_id = $1", booking_id).await
    }

    async fn delete_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.execute("DELETE FROM booking WHERE id = $1", booking_id).await
    }

    async fn insert_payment(
        &mut self,
        booking_id: i64,
        amount: f64,
        status: PaymentStatus,
        payment_date: NaiveDateTime,
        method: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO payment (booking_id, amount, status, payment_date, payment_method)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(booking_id)
        .bind(amount)
        .bind(status.as_str())
        .bind(payment_date)
        .bind(method)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_payment_status(&mut self, payment_id: i64, status: PaymentStatus) -> Result<u64> {
        let result = sqlx::query("UPDATE payment SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(payment_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn payments_for_booking(&mut self, booking_id: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, amount, status, payment_date, payment_method
            FROM payment
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn delete_booking_seats_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.execute(
            "DELETE FROM booking_seat WHERE booking_id IN (SELECT id FROM booking WHERE movie_id = $1)",
            movie_id,
        )
        .await
    }

    async fn delete_payments_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.execute(
            "DELETE FROM payment WHERE booking_id IN (SELECT id FROM booking WHERE movie_id = $1)",
            movie_id,
        )
        .await
    }

    async fn delete_bookings_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.execute("DELETE FROM booking WHERE movie_id = $1", movie_id).await
    }

    async fn showtime_ids_for_movie(&mut self, movie_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM showtime WHERE movie_id = $1 ORDER BY id")
            .bind(movie_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn delete_showtimes_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.execute("DELETE FROM showtime WHERE movie_id = $1", movie_id).await
    }

    async fn delete_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.execute("DELETE FROM movie WHERE id = $1", movie_id).await
    }

    async fn booking_ids_for_showtime(&mut self, showtime_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM booking WHERE showtime_id = $1 ORDER BY id")
            .bind(showtime_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn delete_bookings_for_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.execute("DELETE FROM booking WHERE showtime_id = $1", showtime_id).await
    }

    async fn delete_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.execute("DELETE FROM showtime WHERE id = $1", showtime_id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
