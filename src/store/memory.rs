//! In-process хранилище с тем же транзакционным контрактом, что и у PostgreSQL.
//!
//! Транзакция держит эксклюзивную блокировку таблиц и работает с копией. `commit` подменяет
//! таблицы копией, drop без commit просто выбрасывает её. Точки отказа (`fail_on`) позволяют
//! уронить любой шаг по имени и проверить откат.
//!
//! Пока транзакция открыта, чтение через [`Store`] из той же задачи ждёт блокировку -
//! внутри транзакции читать только через [`StoreTx`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreTx};
use crate::error::{Error, Result};
use crate::models::{
    Booking, Movie, NewMovie, NewUser, Payment, PaymentStatus, ScheduledShowtime, Seat, Showtime, User,
};
use crate::services::seats::seat_sort_key;

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    movies: BTreeMap<i64, Movie>,
    showtimes: BTreeMap<i64, Showtime>,
    seats: BTreeMap<i64, Seat>,
    bookings: BTreeMap<i64, Booking>,
    // (booking_id, seat_id)
    booking_seats: BTreeSet<(i64, i64)>,
    payments: BTreeMap<i64, Payment>,
    users: BTreeMap<i64, User>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn booking_ids_where(&self, pred: impl Fn(&Booking) -> bool) -> Vec<i64> {
        self.bookings.values().filter(|b| pred(b)).map(|b| b.id).collect()
    }

    fn remove_links_for(&mut self, booking_ids: &[i64]) -> u64 {
        let before = self.booking_seats.len();
        self.booking_seats.retain(|(b, _)| !booking_ids.contains(b));
        (before - self.booking_seats.len()) as u64
    }

    fn remove_payments_for(&mut self, booking_ids: &[i64]) -> u64 {
        let before = self.payments.len();
        self.payments.retain(|_, p| !booking_ids.contains(&p.booking_id));
        (before - self.payments.len()) as u64
    }

    fn remove_bookings(&mut self, booking_ids: &[i64]) -> Result<u64> {
        // Ссылка из booking_seat или payment - нарушение внешнего ключа, как в PostgreSQL
        for id in booking_ids {
            if self.booking_seats.iter().any(|(b, _)| b == id) || self.payments.values().any(|p| p.booking_id == *id) {
                return Err(Error::Store(format!("booking {} is still referenced", id)));
            }
        }
        let before = self.bookings.len();
        self.bookings.retain(|id, _| !booking_ids.contains(id));
        Ok((before - self.bookings.len()) as u64)
    }

    fn remove_seats_for_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        let seat_ids: Vec<i64> = self.seats.values().filter(|s| s.showtime_id == showtime_id).map(|s| s.id).collect();
        if self.booking_seats.iter().any(|(_, s)| seat_ids.contains(s)) {
            return Err(Error::Store(format!("seats of showtime {} are still referenced", showtime_id)));
        }
        self.seats.retain(|_, s| s.showtime_id != showtime_id);
        Ok(seat_ids.len() as u64)
    }

    fn remove_showtimes(&mut self, showtime_ids: &[i64]) -> Result<u64> {
        for id in showtime_ids {
            let referenced = self.seats.values().any(|s| s.showtime_id == *id)
                || self.bookings.values().any(|b| b.showtime_id == *id);
            if referenced {
                return Err(Error::Store(format!("showtime {} is still referenced", id)));
            }
        }
        let before = self.showtimes.len();
        self.showtimes.retain(|id, _| !showtime_ids.contains(id));
        Ok((before - self.showtimes.len()) as u64)
    }
}

/// Хранилище в памяти процесса. Клоны разделяют одни и те же таблицы.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_points: Arc<StdMutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Следующий вызов операции с таким именем (например `"delete_showtimes_for_movie"`,
    /// `"begin"`, `"commit"`) вернёт ошибку хранилища, пока точка не снята.
    pub fn fail_on(&self, operation: &str) {
        self.points().insert(operation.to_string());
    }

    pub fn clear_failures(&self) {
        self.points().clear();
    }

    fn points(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.fail_points.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, operation: &str) -> Result<()> {
        check_point(&self.fail_points, operation)
    }

    /// Количество строк по таблицам: (movie, showtime, seat, booking, booking_seat, payment).
    pub async fn row_counts(&self) -> (usize, usize, usize, usize, usize, usize) {
        let t = self.tables.lock().await;
        (
            t.movies.len(),
            t.showtimes.len(),
            t.seats.len(),
            t.bookings.len(),
            t.booking_seats.len(),
            t.payments.len(),
        )
    }
}

fn check_point(points: &StdMutex<HashSet<String>>, operation: &str) -> Result<()> {
    let points = points.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if points.contains(operation) {
        return Err(Error::Store(format!("injected failure in {}", operation)));
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        self.check("begin")?;
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working, fail_points: self.fail_points.clone() }))
    }

    async fn movie(&self, id: i64) -> Result<Option<Movie>> {
        self.check("movie")?;
        Ok(self.tables.lock().await.movies.get(&id).cloned())
    }

    async fn movies(&self) -> Result<Vec<Movie>> {
        self.check("movies")?;
        let mut movies: Vec<Movie> = self.tables.lock().await.movies.values().cloned().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        self.check("movie_by_title")?;
        let t = self.tables.lock().await;
        Ok(t.movies.values().find(|m| m.title == title).cloned())
    }

    async fn showtime(&self, id: i64) -> Result<Option<Showtime>> {
        self.check("showtime")?;
        Ok(self.tables.lock().await.showtimes.get(&id).cloned())
    }

    async fn showtimes(&self) -> Result<Vec<Showtime>> {
        self.check("showtimes")?;
        let mut showtimes: Vec<Showtime> = self.tables.lock().await.showtimes.values().cloned().collect();
        showtimes.sort_by_key(|s| (s.start_datetime, s.id));
        Ok(showtimes)
    }

    async fn showtimes_for_movie(&self, movie_id: i64, date: Option<NaiveDate>) -> Result<Vec<Showtime>> {
        self.check("showtimes_for_movie")?;
        let t = self.tables.lock().await;
        let mut showtimes: Vec<Showtime> = t
            .showtimes
            .values()
            .filter(|s| s.movie_id == movie_id)
            .filter(|s| date.map_or(true, |d| s.start_datetime.date() == d))
            .cloned()
            .collect();
        showtimes.sort_by_key(|s| s.start_datetime);
        Ok(showtimes)
    }

    async fn showtimes_in_hall(&self, hall: &str) -> Result<Vec<ScheduledShowtime>> {
        self.check("showtimes_in_hall")?;
        let t = self.tables.lock().await;
        let mut showtimes: Vec<ScheduledShowtime> = t
            .showtimes
            .values()
            .filter(|s| s.hall == hall)
            .filter_map(|s| {
                t.movies.get(&s.movie_id).map(|m| ScheduledShowtime {
                    id: s.id,
                    movie_id: s.movie_id,
                    start_datetime: s.start_datetime,
                    hall: s.hall.clone(),
                    title: m.title.clone(),
                    duration_minutes: m.duration_minutes,
                })
            })
            .collect();
        showtimes.sort_by_key(|s| s.start_datetime);
        Ok(showtimes)
    }

    async fn showtimes_before(&self, cutoff: NaiveDateTime) -> Result<Vec<Showtime>> {
        self.check("showtimes_before")?;
        let t = self.tables.lock().await;
        let mut showtimes: Vec<Showtime> =
            t.showtimes.values().filter(|s| s.start_datetime < cutoff).cloned().collect();
        showtimes.sort_by_key(|s| s.start_datetime);
        Ok(showtimes)
    }

    async fn seat(&self, id: i64) -> Result<Option<Seat>> {
        self.check("seat")?;
        Ok(self.tables.lock().await.seats.get(&id).cloned())
    }

    async fn seats_for_showtime(&self, showtime_id: i64) -> Result<Vec<Seat>> {
        self.check("seats_for_showtime")?;
        let t = self.tables.lock().await;
        let mut seats: Vec<Seat> = t.seats.values().filter(|s| s.showtime_id == showtime_id).cloned().collect();
        seats.sort_by_key(|s| seat_sort_key(&s.seat_number));
        Ok(seats)
    }

    async fn booking(&self, id: i64) -> Result<Option<Booking>> {
        self.check("booking")?;
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn seat_ids_for_booking(&self, booking_id: i64) -> Result<Vec<i64>> {
        self.check("seat_ids_for_booking")?;
        let t = self.tables.lock().await;
        Ok(t.booking_seats.iter().filter(|(b, _)| *b == booking_id).map(|(_, s)| *s).collect())
    }

    async fn payments_for_booking(&self, booking_id: i64) -> Result<Vec<Payment>> {
        self.check("payments_for_booking")?;
        let t = self.tables.lock().await;
        Ok(t.payments.values().filter(|p| p.booking_id == booking_id).cloned().collect())
    }

    async fn user(&self, id: i64) -> Result<Option<User>> {
        self.check("user")?;
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check("user_by_email")?;
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_points: Arc<StdMutex<HashSet<String>>>,
}

impl MemoryTx {
    fn check(&self, operation: &str) -> Result<()> {
        check_point(&self.fail_points, operation)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_movie(&mut self, movie: &NewMovie) -> Result<i64> {
        self.check("insert_movie")?;
        let id = self.working.next_id();
        self.working.movies.insert(
            id,
            Movie {
                id,
                title: movie.title.clone(),
                genre: movie.genre.clone(),
                duration_minutes: movie.duration_minutes,
                synopsis: movie.synopsis.clone(),
            },
        );
        Ok(id)
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<i64> {
        self.check("insert_user")?;
        if self.working.users.values().any(|u| u.email == user.email) {
            return Err(Error::conflict(format!("email {} is already registered", user.email)));
        }
        let id = self.working.next_id();
        self.working.users.insert(
            id,
            User {
                id,
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
            },
        );
        Ok(id)
    }

    async fn insert_showtime(&mut self, movie_id: i64, start: NaiveDateTime, hall: &str) -> Result<i64> {
        self.check("insert_showtime")?;
        if !self.working.movies.contains_key(&movie_id) {
            return Err(Error::Store(format!("movie {} does not exist", movie_id)));
        }
        let id = self.working.next_id();
        self.working.showtimes.insert(id, Showtime { id, movie_id, start_datetime: start, hall: hall.to_string() });
        Ok(id)
    }

    async fn showtime(&mut self, id: i64) -> Result<Option<Showtime>> {
        self.check("showtime")?;
        Ok(self.working.showtimes.get(&id).cloned())
    }

    async fn delete_seats_for_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.check("delete_seats_for_showtime")?;
        self.working.remove_seats_for_showtime(showtime_id)
    }

    async fn insert_seats(&mut self, showtime_id: i64, seat_numbers: &[String]) -> Result<u64> {
        self.check("insert_seats")?;
        // UNIQUE (showtime_id, seat_number): вся пачка проверяется до первой вставки
        let mut taken: HashSet<&str> = self
            .working
            .seats
            .values()
            .filter(|s| s.showtime_id == showtime_id)
            .map(|s| s.seat_number.as_str())
            .collect();
        if let Some(dup) = seat_numbers.iter().find(|n| !taken.insert(n.as_str())) {
            return Err(Error::Store(format!("duplicate seat {} for showtime {}", dup, showtime_id)));
        }
        for number in seat_numbers {
            let id = self.working.next_id();
            self.working.seats.insert(
                id,
                Seat { id, showtime_id, seat_number: number.clone(), is_booked: false },
            );
        }
        Ok(seat_numbers.len() as u64)
    }

    async fn seat(&mut self, id: i64) -> Result<Option<Seat>> {
        self.check("seat")?;
        Ok(self.working.seats.get(&id).cloned())
    }

    async fn set_seat_booked(&mut self, seat_id: i64, booked: bool) -> Result<u64> {
        self.check("set_seat_booked")?;
        Ok(match self.working.seats.get_mut(&seat_id) {
            Some(seat) => {
                seat.is_booked = booked;
                1
            }
            None => 0,
        })
    }

    async fn claim_seat(&mut self, seat_id: i64) -> Result<u64> {
        self.check("claim_seat")?;
        Ok(match self.working.seats.get_mut(&seat_id) {
            Some(seat) if !seat.is_booked => {
                seat.is_booked = true;
                1
            }
            _ => 0,
        })
    }

    async fn release_seat_if_unlinked(&mut self, seat_id: i64) -> Result<u64> {
        self.check("release_seat_if_unlinked")?;
        if self.working.booking_seats.iter().any(|(_, s)| *s == seat_id) {
            return Ok(0);
        }
        self.set_seat_booked(seat_id, false).await
    }

    async fn booking(&mut self, id: i64) -> Result<Option<Booking>> {
        self.check("booking")?;
        Ok(self.working.bookings.get(&id).cloned())
    }

    async fn insert_booking(&mut self, user_id: i64, movie_id: i64, showtime_id: i64) -> Result<i64> {
        self.check("insert_booking")?;
        let id = self.working.next_id();
        self.working.bookings.insert(id, Booking { id, user_id, movie_id, showtime_id, is_paid: false });
        Ok(id)
    }

    async fn link_seat(&mut self, booking_id: i64, seat_id: i64) -> Result<()> {
        self.check("link_seat")?;
        if self.working.booking_seats.iter().any(|(_, s)| *s == seat_id) {
            return Err(Error::conflict(format!("seat {} is already reserved", seat_id)));
        }
        if !self.working.bookings.contains_key(&booking_id) || !self.working.seats.contains_key(&seat_id) {
            return Err(Error::Store(format!("cannot link seat {} to booking {}", seat_id, booking_id)));
        }
        self.working.booking_seats.insert((booking_id, seat_id));
        Ok(())
    }

    async fn is_seat_linked(&mut self, booking_id: i64, seat_id: i64) -> Result<bool> {
        self.check("is_seat_linked")?;
        Ok(self.working.booking_seats.contains(&(booking_id, seat_id)))
    }

    async fn set_booking_paid(&mut self, booking_id: i64, paid: bool) -> Result<u64> {
        self.check("set_booking_paid")?;
        Ok(match self.working.bookings.get_mut(&booking_id) {
            Some(booking) => {
                booking.is_paid = paid;
                1
            }
            None => 0,
        })
    }

    async fn delete_booking_seats_for_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.check("delete_booking_seats_for_booking")?;
        Ok(self.working.remove_links_for(&[booking_id]))
    }

    async fn delete_payments_for_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.check("delete_payments_for_booking")?;
        Ok(self.working.remove_payments_for(&[booking_id]))
    }

    async fn delete_booking(&mut self, booking_id: i64) -> Result<u64> {
        self.check("delete_booking")?;
        self.working.remove_bookings(&[booking_id])
    }

    async fn insert_payment(
        &mut self,
        booking_id: i64,
        amount: f64,
        status: PaymentStatus,
        payment_date: NaiveDateTime,
        method: &str,
    ) -> Result<i64> {
        self.check("insert_payment")?;
        if !self.working.bookings.contains_key(&booking_id) {
            return Err(Error::Store(format!("booking {} does not exist", booking_id)));
        }
        let id = self.working.next_id();
        self.working.payments.insert(
            id,
            Payment { id, booking_id, amount, status, payment_date, payment_method: method.to_string() },
        );
        Ok(id)
    }

    async fn update_payment_status(&mut self, payment_id: i64, status: PaymentStatus) -> Result<u64> {
        self.check("update_payment_status")?;
        Ok(match self.working.payments.get_mut(&payment_id) {
            Some(payment) => {
                payment.status = status;
                1
            }
            None => 0,
        })
    }

    async fn payments_for_booking(&mut self, booking_id: i64) -> Result<Vec<Payment>> {
        self.check("payments_for_booking")?;
        Ok(self.working.payments.values().filter(|p| p.booking_id == booking_id).cloned().collect())
    }

    async fn delete_booking_seats_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.check("delete_booking_seats_for_movie")?;
        let ids = self.working.booking_ids_where(|b| b.movie_id == movie_id);
        Ok(self.working.remove_links_for(&ids))
    }

    async fn delete_payments_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.check("delete_payments_for_movie")?;
        let ids = self.working.booking_ids_where(|b| b.movie_id == movie_id);
        Ok(self.working.remove_payments_for(&ids))
    }

    async fn delete_bookings_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.check("delete_bookings_for_movie")?;
        let ids = self.working.booking_ids_where(|b| b.movie_id == movie_id);
        self.working.remove_bookings(&ids)
    }

    async fn showtime_ids_for_movie(&mut self, movie_id: i64) -> Result<Vec<i64>> {
        self.check("showtime_ids_for_movie")?;
        Ok(self.working.showtimes.values().filter(|s| s.movie_id == movie_id).map(|s| s.id).collect())
    }

    async fn delete_showtimes_for_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.check("delete_showtimes_for_movie")?;
        let ids: Vec<i64> = self.working.showtimes.values().filter(|s| s.movie_id == movie_id).map(|s| s.id).collect();
        self.working.remove_showtimes(&ids)
    }

    async fn delete_movie(&mut self, movie_id: i64) -> Result<u64> {
        self.check("delete_movie")?;
        let referenced = self.working.showtimes.values().any(|s| s.movie_id == movie_id)
            || self.working.bookings.values().any(|b| b.movie_id == movie_id);
        if referenced {
            return Err(Error::Store(format!("movie {} is still referenced", movie_id)));
        }
        Ok(self.working.movies.remove(&movie_id).map_or(0, |_| 1))
    }

    async fn booking_ids_for_showtime(&mut self, showtime_id: i64) -> Result<Vec<i64>> {
        self.check("booking_ids_for_showtime")?;
        Ok(self.working.booking_ids_where(|b| b.showtime_id == showtime_id))
    }

    async fn delete_bookings_for_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.check("delete_bookings_for_showtime")?;
        let ids = self.working.booking_ids_where(|b| b.showtime_id == showtime_id);
        self.working.remove_bookings(&ids)
    }

    async fn delete_showtime(&mut self, showtime_id: i64) -> Result<u64> {
        self.check("delete_showtime")?;
        self.working.remove_showtimes(&[showtime_id])
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check("commit")?;
        let MemoryTx { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str) -> NewMovie {
        NewMovie { title: title.to_string(), genre: "Drama".to_string(), duration_minutes: 90, synopsis: String::new() }
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_tables_untouched() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_movie(&movie("Heat")).await.unwrap();
        }
        assert_eq!(store.movies().await.unwrap().len(), 0);

        let mut tx = store.begin().await.unwrap();
        tx.insert_movie(&movie("Heat")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.movies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fail_point_fails_named_operation_until_cleared() {
        let store = MemoryStore::new();
        store.fail_on("insert_movie");

        let mut tx = store.begin().await.unwrap();
        assert!(tx.insert_movie(&movie("Alien")).await.unwrap_err().is_store());
        drop(tx);

        store.clear_failures();
        let mut tx = store.begin().await.unwrap();
        assert!(tx.insert_movie(&movie("Alien")).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_referenced_booking_is_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let movie_id = tx.insert_movie(&movie("Up")).await.unwrap();
        let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let showtime_id = tx.insert_showtime(movie_id, start, "Hall 1").await.unwrap();
        tx.insert_seats(showtime_id, &["A1".to_string()]).await.unwrap();
        tx.commit().await.unwrap();

        let seat_id = store.seats_for_showtime(showtime_id).await.unwrap()[0].id;
        let mut tx = store.begin().await.unwrap();
        let booking_id = tx.insert_booking(1, movie_id, showtime_id).await.unwrap();
        tx.link_seat(booking_id, seat_id).await.unwrap();

        assert!(tx.delete_booking(booking_id).await.unwrap_err().is_store());
        assert_eq!(tx.delete_booking_seats_for_booking(booking_id).await.unwrap(), 1);
        assert_eq!(tx.delete_booking(booking_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn seat_numbers_are_unique_per_showtime() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let movie_id = tx.insert_movie(&movie("Ran")).await.unwrap();
        let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let first = tx.insert_showtime(movie_id, start, "Hall 1").await.unwrap();
        let second = tx.insert_showtime(movie_id, start, "Hall 2").await.unwrap();

        let grid = crate::services::seats::seat_numbers(702, 200);
        assert_eq!(tx.insert_seats(first, &grid).await.unwrap(), 140_400);
        assert!(tx.insert_seats(first, &["ZZ200".to_string()]).await.unwrap_err().is_store());
        assert!(tx.insert_seats(second, &["A1".to_string(), "A1".to_string()]).await.unwrap_err().is_store());
        assert_eq!(tx.insert_seats(second, &["A1".to_string()]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn second_link_for_same_seat_is_a_conflict() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let movie_id = tx.insert_movie(&movie("Jaws")).await.unwrap();
        let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let showtime_id = tx.insert_showtime(movie_id, start, "Hall 2").await.unwrap();
        tx.insert_seats(showtime_id, &["A1".to_string()]).await.unwrap();
        tx.commit().await.unwrap();

        let seat_id = store.seats_for_showtime(showtime_id).await.unwrap()[0].id;
        let mut tx = store.begin().await.unwrap();
        let first = tx.insert_booking(1, movie_id, showtime_id).await.unwrap();
        let second = tx.insert_booking(2, movie_id, showtime_id).await.unwrap();
        tx.link_seat(first, seat_id).await.unwrap();

        let err = tx.link_seat(second, seat_id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
