use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub duration_minutes: i32,
    pub synopsis: String,
}

// Данные для создания фильма администратором
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMovie {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[serde(default)]
    pub synopsis: String,
}
