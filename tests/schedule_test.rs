use box_office::services::schedule::ScheduleShowtime;
use box_office::store::Store;
use box_office::Error;

mod support;

use support::{today, TestApp};

async fn check(app: &TestApp, movie_id: i64, time: &str, hall: &str) -> Result<(), Error> {
    app.state.scheduler.validate_at(movie_id, "2030-05-02", time, hall, today()).await
}

#[tokio::test]
async fn buffer_rules_for_same_hall() {
    let app = support::build_app();
    let dune = app.movie("Dune", 120).await;
    let other = app.movie("Paddington", 95).await;
    app.showtime(dune.id, "2030-05-02", "14:00", "Hall 1", 1, 1).await;

    let err = check(&app, other.id, "15:00", "Hall 1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Time conflict with Dune (2:00 PM - 4:00 PM) in the same hall. Need at least 30 minutes between showtimes."
    );
    assert!(matches!(err, Error::Conflict(_)));

    assert!(matches!(check(&app, other.id, "16:30", "Hall 1").await, Err(Error::Conflict(_))));
    assert!(check(&app, other.id, "16:31", "Hall 1").await.is_ok());
    assert!(check(&app, other.id, "14:00", "Hall 2").await.is_ok());
    // зал сравнивается после trim
    assert!(matches!(check(&app, other.id, "15:00", "  Hall 1 ").await, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn validation_rejects_bad_input() {
    let app = support::build_app();
    let movie = app.movie("Dune", 120).await;
    let scheduler = &app.state.scheduler;

    for time in ["24:00", "9:5", "abc"] {
        let result = scheduler.validate_at(movie.id, "2030-05-02", time, "Hall 1", today()).await;
        assert!(matches!(result, Err(Error::Validation(_))), "{time}");
    }
    assert!(scheduler.validate_at(movie.id, "2030-05-02", "09:05", "Hall 1", today()).await.is_ok());
    assert!(scheduler.validate_at(movie.id, "2030-05-02", "23:59", "Hall 1", today()).await.is_ok());

    let past = scheduler.validate_at(movie.id, "2030-04-30", "10:00", "Hall 1", today()).await;
    assert!(matches!(past, Err(Error::Validation(_))));
    let garbage = scheduler.validate_at(movie.id, "tomorrow", "10:00", "Hall 1", today()).await;
    assert!(matches!(garbage, Err(Error::Validation(_))));
    let no_hall = scheduler.validate_at(movie.id, "2030-05-02", "10:00", "   ", today()).await;
    assert!(matches!(no_hall, Err(Error::Validation(_))));

    let missing = scheduler.validate_at(9_999, "2030-05-02", "10:00", "Hall 1", today()).await;
    assert!(matches!(missing, Err(Error::NotFound { entity: "movie", .. })));
}

#[tokio::test]
async fn scheduling_creates_showtime_with_default_grid() {
    let app = support::build_app();
    let movie = app.movie("Dune", 120).await;

    let request = ScheduleShowtime {
        movie_id: movie.id,
        date: "2030-05-03".to_string(),
        time: "20:15".to_string(),
        hall: " Hall 3 ".to_string(),
        rows: None,
        cols: None,
    };
    let showtime_id = app.state.scheduler.schedule_showtime_at(&request, today()).await.expect("schedule");

    let showtime = app.store.showtime(showtime_id).await.unwrap().expect("showtime row");
    assert_eq!(showtime.hall, "Hall 3");
    assert_eq!(showtime.start_datetime.to_string(), "2030-05-03 20:15:00");
    assert_eq!(app.store_seats(showtime_id).await.len(), 150);

    let listed = app.state.catalog.showtimes(movie.id, Some(showtime.start_datetime.date())).await.unwrap();
    assert_eq!(listed.len(), 1);

    let err = app.state.scheduler.schedule_showtime_at(&request, today()).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn failed_seat_grid_discards_showtime() {
    let app = support::build_app();
    let movie = app.movie("Dune", 120).await;

    app.store.fail_on("insert_seats");
    let request = ScheduleShowtime {
        movie_id: movie.id,
        date: "2030-05-03".to_string(),
        time: "10:00".to_string(),
        hall: "Hall 1".to_string(),
        rows: Some(3),
        cols: Some(3),
    };
    let err = app.state.scheduler.schedule_showtime_at(&request, today()).await.unwrap_err();
    assert!(err.is_store());
    app.store.clear_failures();

    let (_, showtimes, seats, ..) = app.store.row_counts().await;
    assert_eq!((showtimes, seats), (0, 0));
}

#[tokio::test]
async fn oversized_grid_is_rejected_before_any_write() {
    let app = support::build_app();
    let movie = app.movie("Dune", 120).await;
    let request = |rows, cols| ScheduleShowtime {
        movie_id: movie.id,
        date: "2030-05-03".to_string(),
        time: "10:00".to_string(),
        hall: "Hall 1".to_string(),
        rows: Some(rows),
        cols: Some(cols),
    };

    for (rows, cols) in [(703, 1), (1, 201), (0, 10), (u32::MAX, u32::MAX)] {
        let err = app.state.scheduler.schedule_showtime_at(&request(rows, cols), today()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{rows}x{cols}");
    }
    let (_, showtimes, seats, ..) = app.store.row_counts().await;
    assert_eq!((showtimes, seats), (0, 0));

    // последний допустимый ряд - ZZ
    let showtime_id = app.state.scheduler.schedule_showtime_at(&request(702, 1), today()).await.expect("schedule");
    let seats = app.state.seats.seats_for_showtime(showtime_id).await.unwrap();
    assert_eq!(seats.len(), 702);
    assert_eq!(seats.last().map(|s| s.seat_number.as_str()), Some("ZZ1"));
}
