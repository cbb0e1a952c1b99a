use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

use crate::models::UserRole;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

/// Пользователь с ролью Admin. Остальным - 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

// Разобрать "Basic base64(email:password)"
fn basic_credentials(parts: &Parts) -> Option<(String, String)> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = auth_header.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (email, password) = credentials.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let (email, password) = basic_credentials(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        // Проверяем пароль по bcrypt-хешу
        let user = state
            .accounts
            .authenticate(&email, &password)
            .await
            .map_err(|e| {
                tracing::error!("authentication lookup failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            tracing::warn!(user_id = user.user_id, "admin route refused");
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(AdminUser(user))
    }
}
