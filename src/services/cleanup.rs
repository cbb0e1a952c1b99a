use chrono::NaiveDate;
use tracing::{error, info};

use crate::error::Result;
use crate::services::cascade::CascadeDeleter;
use crate::store::Store;
use std::sync::Arc;

/// Удаление прошедших сеансов через каскадный движок.
#[derive(Clone)]
pub struct CleanupService {
    store: Arc<dyn Store>,
    cascade: CascadeDeleter,
}

impl CleanupService {
    pub fn new(store: Arc<dyn Store>, cascade: CascadeDeleter) -> Self {
        Self { store, cascade }
    }

    /// Удаляет все сеансы, начавшиеся раньше `today` 00:00. Ошибка по одному сеансу
    /// логируется и не останавливает остальные. Возвращает число удалённых сеансов.
    pub async fn purge_past_showtimes(&self, today: NaiveDate) -> Result<usize> {
        let cutoff = today.and_hms_opt(0, 0, 0).unwrap_or_default();
        let expired = self.store.showtimes_before(cutoff).await?;

        if expired.is_empty() {
            info!("🧹 No past showtimes to cleanup");
            return Ok(0);
        }

        info!("🧹 Found {} past showtimes to cleanup", expired.len());

        let mut removed = 0;
        for showtime in expired {
            match self.cascade.delete_showtime(showtime.id).await {
                Ok(report) => {
                    removed += 1;
                    info!(
                        "🧹 Showtime {} ({}) removed, {} bookings released",
                        showtime.id, showtime.start_datetime, report.bookings
                    );
                }
                Err(e) => {
                    error!("🧹 Failed to remove past showtime {}: {}", showtime.id, e);
                }
            }
        }

        info!("✅ Cleanup completed, {} showtimes removed", removed);
        Ok(removed)
    }
}
