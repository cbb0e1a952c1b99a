//! Схема зала: создание сетки мест для сеанса и переключение флага продажи.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::Seat;
use crate::store::{Store, StoreTx};

/// Метка ряда по индексу с нуля: A..Z, затем AA, AB, ... (биективная base-26).
pub fn row_label(index: u32) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Номера мест построчно: A1..A{cols}, B1..., всего rows*cols.
pub fn seat_numbers(rows: u32, cols: u32) -> Vec<String> {
    (0..rows)
        .flat_map(|row| {
            let label = row_label(row);
            (1..=cols).map(move |col| format!("{}{}", label, col))
        })
        .collect()
}

/// Ключ сортировки "ряд, затем номер": B2 < B10 < AA1.
pub fn seat_sort_key(seat_number: &str) -> (usize, String, u32) {
    let split = seat_number.find(|c: char| c.is_ascii_digit()).unwrap_or(seat_number.len());
    let (row, col) = seat_number.split_at(split);
    (row.len(), row.to_string(), col.parse().unwrap_or(0))
}

/// Ряды A..ZZ.
pub const MAX_ROWS: u32 = 702;
pub const MAX_COLS: u32 = 200;

/// Размер сетки: от 1x1 до `MAX_ROWS` x `MAX_COLS`.
pub fn validate_grid(rows: u32, cols: u32) -> Result<()> {
    if !(1..=MAX_ROWS).contains(&rows) {
        return Err(Error::validation(format!("rows must be between 1 and {}, got {}", MAX_ROWS, rows)));
    }
    if !(1..=MAX_COLS).contains(&cols) {
        return Err(Error::validation(format!("cols must be between 1 and {}, got {}", MAX_COLS, cols)));
    }
    Ok(())
}

/// Заменить сетку мест сеанса внутри уже открытой транзакции.
pub(crate) async fn populate_seats(tx: &mut dyn StoreTx, showtime_id: i64, rows: u32, cols: u32) -> Result<u64> {
    validate_grid(rows, cols)?;
    let removed = tx.delete_seats_for_showtime(showtime_id).await?;
    let numbers = seat_numbers(rows, cols);
    let inserted = tx.insert_seats(showtime_id, &numbers).await?;
    debug!(showtime_id, removed, inserted, "seat grid replaced");
    Ok(inserted)
}

#[derive(Clone)]
pub struct SeatAllocator {
    store: Arc<dyn Store>,
}

impl SeatAllocator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Пересоздаёт все места сеанса: либо появляется полная сетка, либо не меняется ничего.
    pub async fn initialize_seats(&self, showtime_id: i64, rows: u32, cols: u32) -> Result<u64> {
        validate_grid(rows, cols)?;

        let mut tx = self.store.begin().await?;
        if tx.showtime(showtime_id).await?.is_none() {
            return Err(Error::not_found("showtime", showtime_id));
        }

        let inserted = match populate_seats(tx.as_mut(), showtime_id, rows, cols).await {
            Ok(n) => n,
            Err(e) => {
                warn!(showtime_id, error = %e, "seat initialization failed, rolling back");
                tx.rollback().await.ok();
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(showtime_id, rows, cols, "Initialized {} seats", inserted);
        Ok(inserted)
    }

    /// Переключить флаг одного места. Остальные места не затрагиваются.
    pub async fn update_seat_status(&self, seat_id: i64, booked: bool) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.set_seat_booked(seat_id, booked).await? == 0 {
            return Err(Error::not_found("seat", seat_id));
        }
        tx.commit().await?;
        debug!(seat_id, booked, "seat status updated");
        Ok(())
    }

    pub async fn seats_for_showtime(&self, showtime_id: i64) -> Result<Vec<Seat>> {
        if self.store.showtime(showtime_id).await?.is_none() {
            return Err(Error::not_found("showtime", showtime_id));
        }
        self.store.seats_for_showtime(showtime_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn row_labels_roll_over_after_z() {
        assert_eq!(row_label(0), "A");
        assert_eq!(row_label(25), "Z");
        assert_eq!(row_label(26), "AA");
        assert_eq!(row_label(27), "AB");
        assert_eq!(row_label(51), "AZ");
        assert_eq!(row_label(52), "BA");
        assert_eq!(row_label(701), "ZZ");
        assert_eq!(row_label(702), "AAA");
    }

    #[test]
    fn grid_bounds_are_inclusive() {
        assert!(validate_grid(1, 1).is_ok());
        assert!(validate_grid(MAX_ROWS, MAX_COLS).is_ok());
        for (rows, cols) in [(0, 1), (1, 0), (MAX_ROWS + 1, 1), (1, MAX_COLS + 1), (u32::MAX, u32::MAX)] {
            assert!(matches!(validate_grid(rows, cols), Err(Error::Validation(_))), "{rows}x{cols}");
        }
    }

    #[test]
    fn seat_numbers_are_row_major() {
        assert_eq!(seat_numbers(2, 3), vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
    }

    #[test]
    fn sort_key_orders_columns_numerically() {
        let mut numbers = vec!["B10", "AA1", "B2", "A1"];
        numbers.sort_by_key(|n| seat_sort_key(n));
        assert_eq!(numbers, vec!["A1", "B2", "B10", "AA1"]);
    }

    proptest! {
        #[test]
        fn grid_has_unique_well_formed_numbers(rows in 1u32..60, cols in 1u32..40) {
            let numbers = seat_numbers(rows, cols);
            prop_assert_eq!(numbers.len(), (rows * cols) as usize);

            let unique: HashSet<&String> = numbers.iter().collect();
            prop_assert_eq!(unique.len(), numbers.len());

            for n in &numbers {
                let (_, row, col) = seat_sort_key(n);
                prop_assert!(!row.is_empty() && row.chars().all(|c| c.is_ascii_uppercase()));
                prop_assert!(col >= 1 && col <= cols);
            }
        }
    }
}
