pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

pub use error::{Error, Result};

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::{
    accounts::Accounts,
    booking::BookingLifecycle,
    cascade::CascadeDeleter,
    catalog::Catalog,
    cleanup::CleanupService,
    payment::{PaymentGateway, PaymentProcessor, SimulatedGateway},
    schedule::ShowtimeScheduler,
    seats::SeatAllocator,
};
use store::{PgStore, Store};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<dyn Store>,
    pub seats: SeatAllocator,
    pub bookings: BookingLifecycle,
    pub payments: PaymentProcessor,
    pub cascade: CascadeDeleter,
    pub scheduler: ShowtimeScheduler,
    pub cleanup: CleanupService,
    pub catalog: Catalog,
    pub accounts: Accounts,
}

impl AppState {
    /// Собрать сервисы поверх готового хранилища и шлюза.
    pub fn new(config: config::Config, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Arc<Self> {
        let bookings = BookingLifecycle::new(store.clone());
        let cascade = CascadeDeleter::new(store.clone());

        Arc::new(Self {
            seats: SeatAllocator::new(store.clone()),
            payments: PaymentProcessor::new(store.clone(), bookings.clone(), gateway),
            scheduler: ShowtimeScheduler::new(store.clone(), config.booking.clone()),
            cleanup: CleanupService::new(store.clone(), cascade.clone()),
            catalog: Catalog::new(store.clone()),
            accounts: Accounts::new(store.clone(), config.auth.bcrypt_cost),
            bookings,
            cascade,
            store,
            config,
        })
    }

    /// PostgreSQL + миграции + имитация платёжного шлюза.
    pub async fn connect(config: config::Config) -> Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        db.run_migrations()
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;

        let gateway = Arc::new(SimulatedGateway::from_config(&config.payment));
        Ok(Self::new(config, Arc::new(PgStore::new(db)), gateway))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Box Office API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        // Mount the routes from the controllers module
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
