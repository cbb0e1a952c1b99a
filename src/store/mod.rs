//! Хранилище данных кассы.
//!
//! Ядро работает только через два трейта:
//! - [`Store`] - чтение и открытие транзакций;
//! - [`StoreTx`] - все изменения данных. Незакоммиченная транзакция откатывается при drop,
//!   поэтому любой ранний выход через `?` оставляет данные нетронутыми.
//!
//! Реализации: [`postgres::PgStore`] (sqlx + PostgreSQL) и [`memory::MemoryStore`]
//! (in-process, с точками отказа для тестов).

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::models::{Booking, Movie, NewMovie, NewUser, Payment, PaymentStatus, ScheduledShowtime, Seat, Showtime, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Открыть транзакцию. Все записи идут только через неё.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    async fn movie(&self, id: i64) -> Result<Option<Movie>>;
    async fn movies(&self) -> Result<Vec<Movie>>;
    /// Точное совпадение названия.
    async fn movie_by_title(&self, title: &str) -> Result<Option<Movie>>;

    async fn showtime(&self, id: i64) -> Result<Option<Showtime>>;
    /// Все сеансы по времени начала.
    async fn showtimes(&self) -> Result<Vec<Showtime>>;
    /// Сеансы фильма по времени начала, опционально только за указанный день.
    async fn showtimes_for_movie(&self, movie_id: i64, date: Option<NaiveDate>) -> Result<Vec<Showtime>>;
    /// Все сеансы зала вместе с названием и длительностью фильма.
    async fn showtimes_in_hall(&self, hall: &str) -> Result<Vec<ScheduledShowtime>>;
    /// Сеансы, начинающиеся строго раньше `cutoff`.
    async fn showtimes_before(&self, cutoff: NaiveDateTime) -> Result<Vec<Showtime>>;

    async fn seat(&self, id: i64) -> Result<Option<Seat>>;
    /// Места сеанса в порядке ряд, затем номер.
    async fn seats_for_showtime(&self, showtime_id: i64) -> Result<Vec<Seat>>;

    async fn booking(&self, id: i64) -> Result<Option<Booking>>;
    async fn seat_ids_for_booking(&self, booking_id: i64) -> Result<Vec<i64>>;
    async fn payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>>;

    async fn user(&self, id: i64) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait StoreTx: Send {
    async fn insert_movie(&mut self, movie: &NewMovie) -> Result<i64>;
    /// `Conflict`, если email уже занят.
    async fn insert_user(&mut self, user: &NewUser) -> Result<i64>;

    async fn insert_showtime(&mut self, movie_id: i64, start: NaiveDateTime, hall: &str) -> Result<i64>;
    async fn showtime(&mut self, id: i64) -> Result<Option<Showtime>>;

    async fn delete_seats_for_showtime(&mut self, showtime_id: i64) -> Result<u64>;
    async fn insert_seats(&mut self, showtime_id: i64, seat_numbers: &[String]) -> Result<u64>;
    async fn seat(&mut self, id: i64) -> Result<Option<Seat>>;
    async fn set_seat_booked(&mut self, seat_id: i64, booked: bool) -> Result<u64>;
    /// Условное обновление `is_booked: false -> true`. 0 строк - место уже продано.
    async fn claim_seat(&mut self, seat_id: i64) -> Result<u64>;
    /// Снять флаг продажи, если место больше не привязано ни к одной брони.
    async fn release_seat_if_unlinked(&mut self, seat_id: i64) -> Result<u64>;

    /// Строка брони блокируется до конца транзакции.
    async fn booking(&mut self, id: i64) -> Result<Option<Booking>>;
    async fn insert_booking(&mut self, user_id: i64, movie_id: i64, showtime_id: i64) -> Result<i64>;
    /// `Conflict`, если место уже привязано к другой брони.
    async fn link_seat(&mut self, booking_id: i64, seat_id: i64) -> Result<()>;
    async fn is_seat_linked(&mut self, booking_id: i64, seat_id: i64) -> Result<bool>;
    async fn set_booking_paid(&mut self, booking_id: i64, paid: bool) -> Result<u64>;
    async fn delete_booking_seats_for_booking(&mut self, booking_id: i64) -> Result<u64>;
    async fn delete_payments_for_booking(&mut self, booking_id: i64) -> Result<u64>;
    async fn delete_booking(&mut self, booking_id: i64) -> Result<u64>;

    async fn insert_payment(
        &mut self,
        booking_id: i64,
        amount: f64,
        status: PaymentStatus,
        payment_date: NaiveDateTime,
        method: &str,
    ) -> Result<i64>;
    async fn update_payment_status(&mut self, payment_id: i64, status: PaymentStatus) -> Result<u64>;
    async fn payments_for_booking(&mut self, booking_id: i64) -> Result<Vec<Payment>>;

    async fn delete_booking_seats_for_movie(&mut self, movie_id: i64) -> Result<u64>;
    async fn delete_payments_for_movie(&mut self, movie_id: i64) -> Result<u64>;
    async fn delete_bookings_for_movie(&mut self, movie_id: i64) -> Result<u64>;
    async fn showtime_ids_for_movie(&mut self, movie_id: i64) -> Result<Vec<i64>>;
    async fn delete_showtimes_for_movie(&mut self, movie_id: i64) -> Result<u64>;
    async fn delete_movie(&mut self, movie_id: i64) -> Result<u64>;
    async fn booking_ids_for_showtime(&mut self, showtime_id: i64) -> Result<Vec<i64>>;
    async fn delete_bookings_for_showtime(&mut self, showtime_id: i64) -> Result<u64>;
    async fn delete_showtime(&mut self, showtime_id: i64) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}
