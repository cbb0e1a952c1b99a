//! Каскадное удаление фильма или сеанса.
//!
//! Порядок удалений явный: дети всегда раньше родителя, на каскады внешних ключей
//! не полагаемся. Всё выполняется в одной транзакции; при любой ошибке транзакция
//! откатывается на drop и ни одна строка не исчезает.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::store::{Store, StoreTx};

/// Сколько строк удалено из каждой таблицы.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub movies: u64,
    pub showtimes: u64,
    pub seats: u64,
    pub bookings: u64,
    pub booking_seats: u64,
    pub payments: u64,
}

#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn Store>,
}

impl CascadeDeleter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn delete_movie(&self, movie_id: i64) -> Result<DeletionReport> {
        let mut tx = self.store.begin().await?;
        match movie_steps(tx.as_mut(), movie_id).await {
            Ok(report) => {
                tx.commit().await?;
                info!(movie_id, ?report, "movie deleted with dependents");
                Ok(report)
            }
            Err(e) => {
                error!(movie_id, error = %e, "movie deletion rolled back");
                tx.rollback().await.ok();
                Err(e)
            }
        }
    }

    pub async fn delete_showtime(&self, showtime_id: i64) -> Result<DeletionReport> {
        let mut tx = self.store.begin().await?;
        match showtime_steps(tx.as_mut(), showtime_id).await {
            Ok(report) => {
                tx.commit().await?;
                info!(showtime_id, ?report, "showtime deleted with dependents");
                Ok(report)
            }
            Err(e) => {
                error!(showtime_id, error = %e, "showtime deletion rolled back");
                tx.rollback().await.ok();
                Err(e)
            }
        }
    }
}

async fn movie_steps(tx: &mut dyn StoreTx, movie_id: i64) -> Result<DeletionReport> {
    let mut report = DeletionReport::default();

    report.booking_seats = tx.delete_booking_seats_for_movie(movie_id).await?;
    report.payments = tx.delete_payments_for_movie(movie_id).await?;
    report.bookings = tx.delete_bookings_for_movie(movie_id).await?;

    for showtime_id in tx.showtime_ids_for_movie(movie_id).await? {
        report.seats += tx.delete_seats_for_showtime(showtime_id).await?;
    }
    report.showtimes = tx.delete_showtimes_for_movie(movie_id).await?;

    report.movies = tx.delete_movie(movie_id).await?;
    if report.movies == 0 {
        return Err(Error::not_found("movie", movie_id));
    }
    Ok(report)
}

async fn showtime_steps(tx: &mut dyn StoreTx, showtime_id: i64) -> Result<DeletionReport> {
    let mut report = DeletionReport::default();

    for booking_id in tx.booking_ids_for_showtime(showtime_id).await? {
        report.booking_seats += tx.delete_booking_seats_for_booking(booking_id).await?;
        report.payments += tx.delete_payments_for_booking(booking_id).await?;
    }
    report.bookings = tx.delete_bookings_for_showtime(showtime_id).await?;
    report.seats = tx.delete_seats_for_showtime(showtime_id).await?;

    report.showtimes = tx.delete_showtime(showtime_id).await?;
    if report.showtimes == 0 {
        return Err(Error::not_found("showtime", showtime_id));
    }
    Ok(report)
}
