#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use box_office::config::Config;
use box_office::models::{Movie, NewMovie, User};
use box_office::services::accounts::Registration;
use box_office::services::payment::{FixedGateway, PaymentGateway};
use box_office::services::schedule::ScheduleShowtime;
use box_office::store::MemoryStore;
use box_office::AppState;

pub const PASSWORD: &str = "correct horse battery";

static EMAIL_SEQ: AtomicUsize = AtomicUsize::new(0);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 5, 1).expect("valid date")
}

pub fn test_config() -> Config {
    let mut config = Config::for_memory();
    config.auth.bcrypt_cost = 4;
    config
}

pub struct TestApp {
    pub store: MemoryStore,
    pub state: Arc<AppState>,
}

pub fn build_app() -> TestApp {
    build_app_with(Arc::new(FixedGateway::approving()))
}

pub fn build_app_with(gateway: Arc<dyn PaymentGateway>) -> TestApp {
    let store = MemoryStore::new();
    let state = AppState::new(test_config(), Arc::new(store.clone()), gateway);
    TestApp { store, state }
}

pub fn registration() -> Registration {
    let n = EMAIL_SEQ.fetch_add(1, Ordering::Relaxed);
    let email: String = SafeEmail().fake();
    Registration {
        name: Name().fake(),
        email: format!("u{}.{}", n, email),
        password: PASSWORD.to_string(),
    }
}

pub fn basic_auth(email: &str, password: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(format!("{}:{}", email, password)))
}

impl TestApp {
    pub async fn user(&self) -> User {
        self.state.accounts.register(registration()).await.expect("register user")
    }

    pub async fn admin(&self) -> User {
        self.state.accounts.create_admin(registration()).await.expect("create admin")
    }

    pub async fn movie(&self, title: &str, duration_minutes: i32) -> Movie {
        self.state
            .catalog
            .add_movie(NewMovie {
                title: title.to_string(),
                genre: "Drama".to_string(),
                duration_minutes,
                synopsis: String::new(),
            })
            .await
            .expect("add movie")
    }

    pub async fn showtime(&self, movie_id: i64, date: &str, time: &str, hall: &str, rows: u32, cols: u32) -> i64 {
        let request = ScheduleShowtime {
            movie_id,
            date: date.to_string(),
            time: time.to_string(),
            hall: hall.to_string(),
            rows: Some(rows),
            cols: Some(cols),
        };
        self.state
            .scheduler
            .schedule_showtime_at(&request, today())
            .await
            .expect("schedule showtime")
    }

    /// Фильм, сеанс 2x2 и первое место сеанса: (movie_id, showtime_id, seat_id).
    pub async fn screening(&self, hall: &str) -> (i64, i64, i64) {
        let movie = self.movie("Arrival", 116).await;
        let showtime_id = self.showtime(movie.id, "2030-05-02", "18:00", hall, 2, 2).await;
        let seats = self.store_seats(showtime_id).await;
        (movie.id, showtime_id, seats[0])
    }

    pub async fn store_seats(&self, showtime_id: i64) -> Vec<i64> {
        self.state
            .seats
            .seats_for_showtime(showtime_id)
            .await
            .expect("list seats")
            .into_iter()
            .map(|s| s.id)
            .collect()
    }
}
