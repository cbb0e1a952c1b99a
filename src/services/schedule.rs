//! Проверка расписания зала и создание сеанса вместе с сеткой мест.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::BookingConfig;
use crate::error::{Error, Result};
use crate::models::ScheduledShowtime;
use crate::services::seats::{populate_seats, validate_grid};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleShowtime {
    pub movie_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24 часа
    pub time: String,
    pub hall: String,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub cols: Option<u32>,
}

/// Строгий `HH:MM`: ровно две цифры часа 00-23, двоеточие, две цифры минут 00-59.
pub fn validate_time_format(time: &str) -> Result<NaiveTime> {
    let invalid = || Error::validation(format!("invalid time '{}', expected HH:MM (24-hour)", time));

    let bytes = time.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(invalid());
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let hour = u32::from((digits[0] - b'0') * 10 + (digits[1] - b'0'));
    let minute = u32::from((digits[2] - b'0') * 10 + (digits[3] - b'0'));
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

fn parse_date(date: &str, today: NaiveDate) -> Result<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("invalid date '{}', expected YYYY-MM-DD", date)))?;
    if parsed < today {
        return Err(Error::validation(format!("date {} is in the past", parsed)));
    }
    Ok(parsed)
}

fn clock(t: NaiveDateTime) -> String {
    t.format("%-I:%M %p").to_string()
}

/// Первый сеанс зала, с которым интервал `[start, end]` стоит ближе, чем `buffer`.
/// Касание границы зазора тоже считается конфликтом.
pub fn find_conflict(
    start: NaiveDateTime,
    end: NaiveDateTime,
    existing: &[ScheduledShowtime],
    buffer: Duration,
) -> Option<&ScheduledShowtime> {
    existing.iter().find(|other| {
        let compatible = end + buffer < other.start_datetime || start > other.end_datetime() + buffer;
        !compatible
    })
}

#[derive(Clone)]
pub struct ShowtimeScheduler {
    store: Arc<dyn Store>,
    config: BookingConfig,
}

impl ShowtimeScheduler {
    pub fn new(store: Arc<dyn Store>, config: BookingConfig) -> Self {
        Self { store, config }
    }

    pub async fn validate(&self, movie_id: i64, date: &str, time: &str, hall: &str) -> Result<()> {
        self.validate_at(movie_id, date, time, hall, Local::now().date_naive()).await
    }

    pub async fn validate_at(&self, movie_id: i64, date: &str, time: &str, hall: &str, today: NaiveDate) -> Result<()> {
        self.check(movie_id, date, time, hall, today).await.map(|_| ())
    }

    /// Возвращает время начала проверенного сеанса.
    async fn check(&self, movie_id: i64, date: &str, time: &str, hall: &str, today: NaiveDate) -> Result<NaiveDateTime> {
        let time = validate_time_format(time)?;
        let date = parse_date(date, today)?;
        let hall = hall.trim();
        if hall.is_empty() {
            return Err(Error::validation("hall is required"));
        }

        let movie = self.store.movie(movie_id).await?.ok_or_else(|| Error::not_found("movie", movie_id))?;
        let start = date.and_time(time);
        let end = start + Duration::minutes(i64::from(movie.duration_minutes));

        let existing = self.store.showtimes_in_hall(hall).await?;
        let buffer = Duration::minutes(self.config.buffer_minutes);
        if let Some(other) = find_conflict(start, end, &existing, buffer) {
            debug!(movie_id, hall, %start, conflicting = other.id, "schedule conflict");
            return Err(Error::conflict(format!(
                "Time conflict with {} ({} - {}) in the same hall. Need at least {} minutes between showtimes.",
                other.title,
                clock(other.start_datetime),
                clock(other.end_datetime()),
                self.config.buffer_minutes
            )));
        }
        Ok(start)
    }

    pub async fn schedule_showtime(&self, request: &ScheduleShowtime) -> Result<i64> {
        self.schedule_showtime_at(request, Local::now().date_naive()).await
    }

    /// Проверка расписания, затем сеанс и его места в одной транзакции.
    pub async fn schedule_showtime_at(&self, request: &ScheduleShowtime, today: NaiveDate) -> Result<i64> {
        let rows = request.rows.unwrap_or(self.config.default_rows);
        let cols = request.cols.unwrap_or(self.config.default_cols);
        validate_grid(rows, cols)?;
        let start = self.check(request.movie_id, &request.date, &request.time, &request.hall, today).await?;
        let hall = request.hall.trim();

        let mut tx = self.store.begin().await?;
        let showtime_id = tx.insert_showtime(request.movie_id, start, hall).await?;
        let seats = match populate_seats(tx.as_mut(), showtime_id, rows, cols).await {
            Ok(n) => n,
            Err(e) => {
                warn!(movie_id = request.movie_id, hall, error = %e, "seat grid failed, showtime discarded");
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(showtime_id, movie_id = request.movie_id, hall, %start, seats, "showtime scheduled");
        Ok(showtime_id)
    }
}
