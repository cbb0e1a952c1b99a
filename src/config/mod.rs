use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    pub payment: PaymentConfig,
    pub cleanup: CleanupConfig,
    pub auth: AuthConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_json: bool,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Расписание и схема зала
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Минимальный зазор между сеансами в одном зале, минуты.
    pub buffer_minutes: i64,
    pub default_rows: u32,
    pub default_cols: u32,
}

/// Вероятности успеха для имитации платёжного шлюза.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub credit_card_rate: f64,
    pub debit_card_rate: f64,
    pub paypal_rate: f64,
    pub bank_transfer_rate: f64,
    pub default_rate: f64,
}

// Очистка прошедших сеансов
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { buffer_minutes: 30, default_rows: 10, default_cols: 15 }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            credit_card_rate: 0.85,
            debit_card_rate: 0.90,
            paypal_rate: 0.75,
            bank_transfer_rate: 0.70,
            default_rate: 0.80,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { interval_seconds: 3600 }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { bcrypt_cost: bcrypt::DEFAULT_COST, admin_email: None, admin_password: None }
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid {}", key, std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let booking = BookingConfig::default();
        let payment = PaymentConfig::default();
        let cleanup = CleanupConfig::default();
        let auth = AuthConfig::default();

        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("PORT", 8000),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "box_office=debug,tower_http=debug".to_string()),
                log_json: env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: var_or("DB_POOL_SIZE", 20),
            },
            booking: BookingConfig {
                buffer_minutes: var_or("SHOWTIME_BUFFER_MINUTES", booking.buffer_minutes),
                default_rows: var_or("DEFAULT_SEAT_ROWS", booking.default_rows),
                default_cols: var_or("DEFAULT_SEAT_COLS", booking.default_cols),
            },
            payment: PaymentConfig {
                credit_card_rate: var_or("PAYMENT_RATE_CREDIT_CARD", payment.credit_card_rate),
                debit_card_rate: var_or("PAYMENT_RATE_DEBIT_CARD", payment.debit_card_rate),
                paypal_rate: var_or("PAYMENT_RATE_PAYPAL", payment.paypal_rate),
                bank_transfer_rate: var_or("PAYMENT_RATE_BANK_TRANSFER", payment.bank_transfer_rate),
                default_rate: var_or("PAYMENT_RATE_DEFAULT", payment.default_rate),
            },
            cleanup: CleanupConfig {
                interval_seconds: var_or("CLEANUP_INTERVAL_SECONDS", cleanup.interval_seconds),
            },
            auth: AuthConfig {
                bcrypt_cost: var_or("BCRYPT_COST", auth.bcrypt_cost),
                admin_email: env::var("ADMIN_EMAIL").ok(),
                admin_password: env::var("ADMIN_PASSWORD").ok(),
            },
        }
    }

    /// Конфигурация без окружения: in-memory хранилище и тесты.
    pub fn for_memory() -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                rust_log: "box_office=debug".to_string(),
                log_json: false,
            },
            database: DatabaseConfig { url: String::new(), pool_size: 1 },
            booking: BookingConfig::default(),
            payment: PaymentConfig::default(),
            cleanup: CleanupConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}
