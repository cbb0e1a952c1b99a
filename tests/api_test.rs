use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use box_office::router;

mod support;

use support::{basic_auth, TestApp, PASSWORD};

async fn send(app: &Router, method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

struct Fixture {
    app: TestApp,
    router: Router,
    admin: String,
    alice: String,
    bob: String,
}

async fn fixture() -> Fixture {
    let app = support::build_app();
    let router = router(app.state.clone());
    let admin = app.admin().await;
    let alice = app.user().await;
    let bob = app.user().await;
    Fixture {
        admin: basic_auth(&admin.email, PASSWORD),
        alice: basic_auth(&alice.email, PASSWORD),
        bob: basic_auth(&bob.email, PASSWORD),
        app,
        router,
    }
}

// Фильм и сеанс в далёком будущем через API администратора: (movie_id, showtime_id, первое место).
async fn schedule(f: &Fixture) -> (i64, i64, i64) {
    let (status, movie) = send(
        &f.router,
        "POST",
        "/api/movies",
        Some(&f.admin),
        Some(json!({ "title": "Solaris", "duration_minutes": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let movie_id = movie["id"].as_i64().unwrap();

    let (status, created) = send(
        &f.router,
        "POST",
        "/api/showtimes",
        Some(&f.admin),
        Some(json!({ "movie_id": movie_id, "date": "2099-01-10", "time": "14:00", "hall": "Hall 1", "rows": 2, "cols": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let showtime_id = created["id"].as_i64().unwrap();

    let (status, seats) = send(&f.router, "GET", &format!("/api/showtimes/{}/seats", showtime_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats.as_array().unwrap().len(), 4);
    (movie_id, showtime_id, seats[0]["id"].as_i64().unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let f = fixture().await;
    let (status, _) = send(&f.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_reject_other_users() {
    let f = fixture().await;
    let body = json!({ "title": "Solaris", "duration_minutes": 120 });

    let (status, _) = send(&f.router, "POST", "/api/movies", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&f.router, "POST", "/api/movies", Some(&f.alice), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let wrong = basic_auth("nobody@example.com", PASSWORD);
    let (status, _) = send(&f.router, "POST", "/api/movies", Some(&wrong), Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&f.router, "DELETE", "/api/movies/1", Some(&f.alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, movie) = send(&f.router, "POST", "/api/movies", Some(&f.admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movie["title"], "Solaris");
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let f = fixture().await;
    let (movie_id, showtime_id, seat_id) = schedule(&f).await;

    let clash = json!({ "movie_id": movie_id, "date": "2099-01-10", "time": "16:30", "hall": "Hall 1" });
    let (status, body) = send(&f.router, "POST", "/api/showtimes/validate", Some(&f.admin), Some(clash)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Time conflict with Solaris (2:00 PM - 4:00 PM)"));

    let bad_time = json!({ "movie_id": movie_id, "date": "2099-01-10", "time": "9:5", "hall": "Hall 1" });
    let (status, _) = send(&f.router, "POST", "/api/showtimes/validate", Some(&f.admin), Some(bad_time)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&f.router, "DELETE", "/api/showtimes/987654", Some(&f.admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let booking = json!({ "seat_id": seat_id, "movie_id": movie_id, "showtime_id": showtime_id });
    let (status, _) = send(&f.router, "POST", "/api/bookings", Some(&f.alice), Some(booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&f.router, "POST", "/api/bookings", Some(&f.bob), Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn booking_owner_can_pay_and_others_cannot_touch_it() {
    let f = fixture().await;
    let (movie_id, showtime_id, seat_id) = schedule(&f).await;

    let booking = json!({ "seat_id": seat_id, "movie_id": movie_id, "showtime_id": showtime_id });
    let (status, created) = send(&f.router, "POST", "/api/bookings", Some(&f.alice), Some(booking)).await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = created["id"].as_i64().unwrap();

    let cancel = json!({ "booking_id": booking_id, "seat_id": seat_id });
    let (status, _) = send(&f.router, "PATCH", "/api/bookings/cancel", Some(&f.bob), Some(cancel)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let pay = json!({ "booking_id": booking_id, "amount": 15.0, "method": "Credit Card" });
    let (status, _) = send(&f.router, "POST", "/api/bookings/pay", Some(&f.bob), Some(pay.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, outcome) = send(&f.router, "POST", "/api/bookings/pay", Some(&f.alice), Some(pay)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "COMPLETED");

    let (_, seats) = send(&f.router, "GET", &format!("/api/showtimes/{}/seats", showtime_id), None, None).await;
    assert_eq!(seats[0]["is_booked"], true);
}

#[tokio::test]
async fn movie_deletion_cascades_over_http() {
    let f = fixture().await;
    let (movie_id, showtime_id, _) = schedule(&f).await;

    let (status, report) = send(&f.router, "DELETE", &format!("/api/movies/{}", movie_id), Some(&f.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["showtimes"], 1);
    assert_eq!(report["seats"], 4);

    let (status, _) = send(&f.router, "GET", &format!("/api/showtimes/{}/seats", showtime_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, movies) = send(&f.router, "GET", "/api/movies", None, None).await;
    assert!(movies.as_array().unwrap().is_empty());
    assert_eq!(f.app.store.row_counts().await, (0, 0, 0, 0, 0, 0));
}

#[tokio::test]
async fn register_and_me() {
    let f = fixture().await;
    let registration = support::registration();
    let body = json!({ "name": registration.name, "email": registration.email, "password": registration.password });

    let (status, user) = send(&f.router, "POST", "/api/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "User");
    assert!(user.get("password_hash").is_none());

    let (status, _) = send(&f.router, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let auth = basic_auth(&registration.email, PASSWORD);
    let (status, me) = send(&f.router, "GET", "/api/me", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], registration.email.as_str());
}

#[tokio::test]
async fn movie_and_schedule_lookups() {
    let f = fixture().await;
    let (movie_id, showtime_id, _) = schedule(&f).await;

    let (status, movie) = send(&f.router, "GET", &format!("/api/movies/{}", movie_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movie["title"], "Solaris");
    let (status, _) = send(&f.router, "GET", "/api/movies/987654", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, movie) = send(&f.router, "GET", "/api/movies/by-title/Solaris", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movie["id"], movie_id);
    let (status, body) = send(&f.router, "GET", "/api/movies/by-title/Stalker", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(&f.router, "GET", "/api/showtimes/all", Some(&f.alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, all) = send(&f.router, "GET", "/api/showtimes/all", Some(&f.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], showtime_id);
}

#[tokio::test]
async fn oversized_grid_is_rejected_on_scheduling() {
    let f = fixture().await;
    let (movie_id, ..) = schedule(&f).await;

    let body = json!({ "movie_id": movie_id, "date": "2099-01-11", "time": "10:00", "hall": "Hall 2", "rows": 703, "cols": 1 });
    let (status, body) = send(&f.router, "POST", "/api/showtimes", Some(&f.admin), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let (_, showtimes, seats, ..) = f.app.store.row_counts().await;
    assert_eq!((showtimes, seats), (1, 4));
}

#[tokio::test]
async fn cancel_with_foreign_seat_is_rejected() {
    let f = fixture().await;
    let (movie_id, showtime_id, seat_id) = schedule(&f).await;

    let booking = json!({ "seat_id": seat_id, "movie_id": movie_id, "showtime_id": showtime_id });
    let (_, created) = send(&f.router, "POST", "/api/bookings", Some(&f.alice), Some(booking)).await;
    let booking_id = created["id"].as_i64().unwrap();

    let cancel = json!({ "booking_id": booking_id, "seat_id": seat_id + 1 });
    let (status, _) = send(&f.router, "PATCH", "/api/bookings/cancel", Some(&f.alice), Some(cancel)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let cancel = json!({ "booking_id": booking_id, "seat_id": seat_id });
    let (status, _) = send(&f.router, "PATCH", "/api/bookings/cancel", Some(&f.alice), Some(cancel)).await;
    assert_eq!(status, StatusCode::OK);
}
