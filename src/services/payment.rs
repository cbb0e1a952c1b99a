//! payment.rs
//!
//! Обработка оплаты брони.
//!
//! Ключевые компоненты:
//! 1.  **PaymentGateway**: решение "прошёл ли платёж". Реальной интеграции нет,
//!     по умолчанию работает [`SimulatedGateway`] с вероятностью успеха по способу оплаты.
//! 2.  **PaymentProcessor**: записывает платёж в статусе PENDING, спрашивает шлюз,
//!     фиксирует итоговый статус и продвигает бронь через [`BookingLifecycle`].

use async_trait::async_trait;
use chrono::Local;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::PaymentConfig;
use crate::error::{Error, Result};
use crate::models::PaymentStatus;
use crate::services::booking::BookingLifecycle;
use crate::store::Store;

/// Источник решения об успехе платежа.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, method: &str, amount: f64) -> bool;
}

/// Имитация шлюза: независимый бросок монеты на каждый вызов.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    rates: PaymentConfig,
}

impl SimulatedGateway {
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self { rates: config.clone() }
    }

    /// Вероятность успеха для способа оплаты, без учёта регистра.
    pub fn success_rate(&self, method: &str) -> f64 {
        match method.trim().to_lowercase().as_str() {
            "credit card" => self.rates.credit_card_rate,
            "debit card" => self.rates.debit_card_rate,
            "paypal" => self.rates.paypal_rate,
            "bank transfer" => self.rates.bank_transfer_rate,
            _ => self.rates.default_rate,
        }
    }

    fn roll(&self, rate: f64) -> bool {
        rand::thread_rng().gen_bool(rate.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, method: &str, amount: f64) -> bool {
        let rate = self.success_rate(method);
        let approved = self.roll(rate);
        info!(method, amount, rate, approved, "simulated gateway decision");
        approved
    }
}

/// Шлюз с заранее известным ответом.
#[derive(Debug, Clone, Copy)]
pub struct FixedGateway {
    approve: bool,
}

impl FixedGateway {
    pub fn approving() -> Self {
        Self { approve: true }
    }

    pub fn declining() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl PaymentGateway for FixedGateway {
    async fn authorize(&self, _method: &str, _amount: f64) -> bool {
        self.approve
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentOutcome {
    pub payment_id: i64,
    pub status: PaymentStatus,
}

#[derive(Clone)]
pub struct PaymentProcessor {
    store: Arc<dyn Store>,
    lifecycle: BookingLifecycle,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentProcessor {
    pub fn new(store: Arc<dyn Store>, lifecycle: BookingLifecycle, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, lifecycle, gateway }
    }

    pub async fn process_payment(&self, booking_id: i64, amount: f64, method: &str) -> Result<PaymentOutcome> {
        let method = method.trim();
        if amount.is_nan() || amount <= 0.0 {
            return Err(Error::validation("amount must be greater than zero"));
        }
        if method.is_empty() {
            return Err(Error::validation("payment method is required"));
        }

        let booking = self.store.booking(booking_id).await?.ok_or_else(|| Error::not_found("booking", booking_id))?;
        if booking.is_paid {
            return Err(Error::conflict(format!("booking {} is already paid", booking_id)));
        }
        let seat_id = self
            .store
            .seat_ids_for_booking(booking_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("seat for booking", booking_id))?;

        let payment_id = self.record_pending(booking_id, amount, method).await?;
        info!(payment_id, booking_id, amount, method, "payment created");

        let status = if self.gateway.authorize(method, amount).await {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };

        if let Err(e) = self.record_status(payment_id, status).await {
            error!(payment_id, booking_id, %status, error = %e, "failed to record payment status");
            return Err(e);
        }

        match status {
            PaymentStatus::Completed => {
                if let Err(e) = self.lifecycle.confirm_payment(booking_id, seat_id).await {
                    error!(payment_id, booking_id, seat_id, error = %e, "payment completed but booking was not confirmed");
                    return Err(Error::Inconsistent(format!(
                        "payment {} completed but booking {} was not confirmed: {}",
                        payment_id, booking_id, e
                    )));
                }
                info!(payment_id, booking_id, "payment completed");
            }
            _ => {
                self.lifecycle.fail_payment(booking_id, seat_id).await?;
                warn!(payment_id, booking_id, method, "payment declined, booking released");
            }
        }

        Ok(PaymentOutcome { payment_id, status })
    }

    /// Новая попытка записывается под блокировкой брони, и только если у брони нет
    /// другой попытки в статусе PENDING или COMPLETED.
    async fn record_pending(&self, booking_id: i64, amount: f64, method: &str) -> Result<i64> {
        let mut tx = self.store.begin().await?;
        let booking = tx.booking(booking_id).await?.ok_or_else(|| Error::not_found("booking", booking_id))?;
        if booking.is_paid {
            return Err(Error::conflict(format!("booking {} is already paid", booking_id)));
        }
        let open = tx.payments_for_booking(booking_id).await?;
        if let Some(other) = open.iter().find(|p| p.status.blocks_new_attempt()) {
            warn!(booking_id, payment_id = other.id, status = %other.status, "payment attempt rejected");
            return Err(Error::conflict(format!(
                "booking {} already has a {} payment",
                booking_id, other.status
            )));
        }

        let now = Local::now().naive_local();
        let payment_id = tx.insert_payment(booking_id, amount, PaymentStatus::Pending, now, method).await?;
        tx.commit().await?;
        Ok(payment_id)
    }

    async fn record_status(&self, payment_id: i64, status: PaymentStatus) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.update_payment_status(payment_id, status).await? == 0 {
            return Err(Error::not_found("payment", payment_id));
        }
        tx.commit().await
    }
}
