use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub movie_id: i64,
    pub start_datetime: NaiveDateTime,
    pub hall: String,
}

/// Сеанс вместе с названием и длительностью фильма - всё, что нужно для проверки расписания.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ScheduledShowtime {
    pub id: i64,
    pub movie_id: i64,
    pub start_datetime: NaiveDateTime,
    pub hall: String,
    pub title: String,
    pub duration_minutes: i32,
}

impl ScheduledShowtime {
    pub fn end_datetime(&self) -> NaiveDateTime {
        self.start_datetime + Duration::minutes(i64::from(self.duration_minutes))
    }
}
