//! Жизненный цикл одной попытки бронирования:
//! место свободно -> бронь без оплаты -> оплачено, либо бронь отменена и место снова свободно.
//!
//! Все переходы выполняются в одной транзакции хранилища. Резерв места держится уникальной
//! связью `booking_seat.seat_id`, а флаг `is_booked` выставляется только после оплаты.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReserveSeat {
    pub seat_id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub showtime_id: i64,
}

#[derive(Clone)]
pub struct BookingLifecycle {
    store: Arc<dyn Store>,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Создаёт неоплаченную бронь и привязывает к ней место. Возвращает id брони.
    pub async fn reserve_seat(&self, request: ReserveSeat) -> Result<i64> {
        let ReserveSeat { seat_id, user_id, movie_id, showtime_id } = request;

        if self.store.user(user_id).await?.is_none() {
            return Err(Error::not_found("user", user_id));
        }

        let mut tx = self.store.begin().await?;

        let seat = tx.seat(seat_id).await?.ok_or_else(|| Error::not_found("seat", seat_id))?;
        if seat.showtime_id != showtime_id {
            return Err(Error::validation(format!(
                "seat {} does not belong to showtime {}",
                seat.seat_number, showtime_id
            )));
        }
        let showtime = tx
            .showtime(showtime_id)
            .await?
            .ok_or_else(|| Error::not_found("showtime", showtime_id))?;
        if showtime.movie_id != movie_id {
            return Err(Error::validation(format!("showtime {} does not screen movie {}", showtime_id, movie_id)));
        }
        if seat.is_booked {
            return Err(Error::conflict(format!("seat {} is already booked", seat.seat_number)));
        }

        let booking_id = tx.insert_booking(user_id, movie_id, showtime_id).await?;
        if let Err(e) = tx.link_seat(booking_id, seat_id).await {
            // drop транзакции откатывает и строку брони
            warn!(seat_id, user_id, error = %e, "seat reservation rejected");
            return Err(e);
        }
        tx.commit().await?;

        info!(booking_id, seat_id, user_id, showtime_id, "seat reserved");
        Ok(booking_id)
    }

    /// Пользователь ушёл до оплаты. Повторный вызов для удалённой брони ничего не делает.
    pub async fn abandon_booking(&self, booking_id: i64, seat_id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let Some(booking) = tx.booking(booking_id).await? else {
            debug!(booking_id, "booking already gone, nothing to abandon");
            return Ok(());
        };
        if booking.is_paid {
            return Err(Error::conflict(format!("booking {} is already paid", booking_id)));
        }

        remove_unpaid_booking(tx.as_mut(), booking_id, seat_id).await?;
        tx.commit().await?;

        info!(booking_id, seat_id, "booking abandoned, seat released");
        Ok(())
    }

    /// Оплата прошла: бронь оплачена, место продано. Место занимается условным апдейтом.
    pub async fn confirm_payment(&self, booking_id: i64, seat_id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let booking = tx.booking(booking_id).await?.ok_or_else(|| Error::not_found("booking", booking_id))?;
        let seat = tx.seat(seat_id).await?.ok_or_else(|| Error::not_found("seat", seat_id))?;
        if !tx.is_seat_linked(booking_id, seat_id).await? {
            return Err(Error::validation(format!(
                "seat {} is not part of booking {}",
                seat.seat_number, booking_id
            )));
        }
        if booking.is_paid {
            return Err(Error::conflict(format!("booking {} is already paid", booking_id)));
        }

        if tx.claim_seat(seat_id).await? == 0 {
            warn!(booking_id, seat_id, "seat was sold before confirmation");
            return Err(Error::conflict(format!("seat {} is already booked", seat.seat_number)));
        }
        tx.set_booking_paid(booking_id, true).await?;
        tx.commit().await?;

        info!(booking_id, seat_id, "payment confirmed, seat sold");
        Ok(())
    }

    /// Оплата не прошла: бронь удаляется вместе со связями и платежами, место свободно.
    pub async fn fail_payment(&self, booking_id: i64, seat_id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let booking = tx.booking(booking_id).await?.ok_or_else(|| Error::not_found("booking", booking_id))?;
        if booking.is_paid {
            return Err(Error::conflict(format!("booking {} is already paid", booking_id)));
        }

        remove_unpaid_booking(tx.as_mut(), booking_id, seat_id).await?;
        tx.commit().await?;

        info!(booking_id, seat_id, "payment failed, booking removed");
        Ok(())
    }
}

/// Дочерние строки удаляются раньше брони, затем место освобождается,
/// если его не держит другая бронь. Место должно принадлежать этой брони.
async fn remove_unpaid_booking(tx: &mut dyn StoreTx, booking_id: i64, seat_id: i64) -> Result<()> {
    if !tx.is_seat_linked(booking_id, seat_id).await? {
        return Err(Error::validation(format!("seat {} is not part of booking {}", seat_id, booking_id)));
    }
    let links = tx.delete_booking_seats_for_booking(booking_id).await?;
    let payments = tx.delete_payments_for_booking(booking_id).await?;
    tx.delete_booking(booking_id).await?;
    let released = tx.release_seat_if_unlinked(seat_id).await?;
    debug!(booking_id, seat_id, links, payments, released, "unpaid booking removed");
    Ok(())
}
