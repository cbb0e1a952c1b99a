use anyhow::Context;
use chrono::Local;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use box_office::{config::Config, router, services::accounts::Registration, AppState, Error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    if config.app.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting Box Office API");

    // Connect to the database and run migrations
    let app_state = AppState::connect(config.clone())
        .await
        .context("Failed to initialize database")?;
    info!("Database connected");

    // Bootstrap the admin account if configured
    if let (Some(email), Some(password)) = (&config.auth.admin_email, &config.auth.admin_password) {
        let admin = Registration {
            name: "Administrator".to_string(),
            email: email.clone(),
            password: password.clone(),
        };
        match app_state.accounts.create_admin(admin).await {
            Ok(user) => info!(user_id = user.id, "Admin account created"),
            Err(Error::Conflict(_)) => info!("Admin account already exists"),
            Err(e) => warn!("Failed to create admin account: {}", e),
        }
    }

    // --- Start background tasks ---

    // Remove past showtimes at startup and then on every interval
    let cleanup = app_state.cleanup.clone();
    let interval = Duration::from_secs(config.cleanup.interval_seconds.max(1));
    task::spawn(async move {
        loop {
            if let Err(e) = cleanup.purge_past_showtimes(Local::now().date_naive()).await {
                error!("Showtime cleanup failed: {}", e);
            }
            tokio::time::sleep(interval).await;
        }
    });

    // --- Start the web server ---

    let app = router(app_state);

    let host: std::net::IpAddr = config.app.host.parse().context("HOST must be an IP address")?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
