use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::{Movie, NewMovie, Showtime};
use crate::store::Store;

/// Фильмы и сеансы для администратора и витрины.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn add_movie(&self, movie: NewMovie) -> Result<Movie> {
        let movie = NewMovie {
            title: movie.title.trim().to_string(),
            genre: movie.genre.trim().to_string(),
            synopsis: movie.synopsis.trim().to_string(),
            ..movie
        };
        movie.validate()?;

        let mut tx = self.store.begin().await?;
        let id = tx.insert_movie(&movie).await?;
        tx.commit().await?;

        info!(movie_id = id, title = %movie.title, "movie added");
        Ok(Movie {
            id,
            title: movie.title,
            genre: movie.genre,
            duration_minutes: movie.duration_minutes,
            synopsis: movie.synopsis,
        })
    }

    pub async fn movies(&self) -> Result<Vec<Movie>> {
        self.store.movies().await
    }

    pub async fn movie(&self, id: i64) -> Result<Movie> {
        self.store.movie(id).await?.ok_or_else(|| Error::not_found("movie", id))
    }

    /// Фильм с точно таким названием, если есть.
    pub async fn movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("title is required"));
        }
        self.store.movie_by_title(title).await
    }

    /// Расписание всех залов по времени начала.
    pub async fn all_showtimes(&self) -> Result<Vec<Showtime>> {
        self.store.showtimes().await
    }

    /// Сеансы фильма по времени начала; с `date` - только за этот день.
    pub async fn showtimes(&self, movie_id: i64, date: Option<NaiveDate>) -> Result<Vec<Showtime>> {
        self.movie(movie_id).await?;
        self.store.showtimes_for_movie(movie_id, date).await
    }
}
