use thiserror::Error;

/// Ошибки ядра кассы. `Display` каждой ошибки - готовое сообщение для пользователя.
#[derive(Debug, Error)]
pub enum Error {
    /// Неверный формат входных данных, дата в прошлом, пустое обязательное поле.
    #[error("{0}")]
    Validation(String),

    /// Фильм, сеанс, место, бронь или пользователь не найдены.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Место уже занято, пересечение расписания, дубликат email.
    #[error("{0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Database(#[from] sqlx::Error),

    /// Ошибка хранилища, не связанного с sqlx (in-memory и т.п.).
    #[error("store error: {0}")]
    Store(String),

    /// Многошаговая операция выполнилась частично - нужен повтор или ручной разбор.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Store(_))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<String> = field_errors.keys().map(|k| k.to_string()).collect();
        fields.sort();
        Error::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}
