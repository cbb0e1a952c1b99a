//! Регистрация и вход. Пароли хранятся только как bcrypt-хеш.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserRole};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl Accounts {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn register(&self, registration: Registration) -> Result<User> {
        self.create(registration, UserRole::User).await
    }

    /// Для начальной настройки: тот же путь, что и регистрация, но с ролью Admin.
    pub async fn create_admin(&self, registration: Registration) -> Result<User> {
        self.create(registration, UserRole::Admin).await
    }

    /// `None`, если пользователя нет или пароль не подходит.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Ok(None);
        }
        let Some(user) = self.store.user_by_email(email).await? else {
            debug!(email, "unknown email");
            return Ok(None);
        };

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            let ok = user.verify_password(&password);
            (user, ok)
        })
        .await
        .map_err(|e| Error::Store(format!("password check aborted: {}", e)))?;

        Ok(match verified {
            (user, true) => Some(user),
            (user, false) => {
                debug!(user_id = user.id, "password mismatch");
                None
            }
        })
    }

    async fn create(&self, registration: Registration, role: UserRole) -> Result<User> {
        let registration = Registration {
            name: registration.name.trim().to_string(),
            email: registration.email.trim().to_string(),
            password: registration.password,
        };
        registration.validate()?;

        if self.store.user_by_email(&registration.email).await?.is_some() {
            return Err(Error::conflict(format!("email {} is already registered", registration.email)));
        }

        let cost = self.bcrypt_cost;
        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| Error::Store(format!("password hashing aborted: {}", e)))?
            .map_err(|e| Error::Store(format!("password hashing failed: {}", e)))?;

        let new_user = NewUser { name: registration.name, email: registration.email, password_hash, role };
        let mut tx = self.store.begin().await?;
        let id = tx.insert_user(&new_user).await?;
        tx.commit().await?;

        info!(user_id = id, email = %new_user.email, %role, "account created");
        Ok(User {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role,
        })
    }
}
