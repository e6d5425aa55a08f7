use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::User;
use crate::profile::PROFILE_MAIL_DOMAIN;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Account registration, login and bearer-token resolution.
///
/// Tokens are opaque random values; only their SHA-256 digest is stored, so
/// a leaked sessions table yields nothing replayable.
pub struct AuthService {
    pool: PgPool,
    session_ttl_secs: i64,
}

/// Hex SHA-256 digest of a bearer token, the form stored in `sessions`.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl AuthService {
    pub fn new(pool: PgPool, session_ttl_secs: i64) -> Self {
        Self {
            pool,
            session_ttl_secs,
        }
    }

    /// Creates a new account plus its default sales profile.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }
        if password.len() < 4 {
            return Err(AppError::Validation(
                "Password must be at least 4 characters".to_string(),
            ));
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Validation(
                "Username already registered".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, name, role, email, id_emp)
            VALUES ($1, $2, 'Junior Sales', $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(format!("{}@{}", user.username, PROFILE_MAIL_DOMAIN))
        .bind(format!("SLS-{}", user.id))
        .execute(&self.pool)
        .await?;

        tracing::info!("Registered user '{}' (id {})", user.username, user.id);
        Ok(user)
    }

    /// Verifies credentials and issues a fresh session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Incorrect username or password".to_string())
            })?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::Unauthorized(
                "Incorrect username or password".to_string(),
            ));
        }

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = Utc::now() + Duration::seconds(self.session_ttl_secs);

        sqlx::query("INSERT INTO sessions (token_digest, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_digest(&token))
            .bind(user.id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Issued session for user '{}'", user.username);
        Ok(token)
    }

    /// Resolves a bearer token to its user id, if the session is still live.
    pub async fn resolve_token(&self, token: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM sessions WHERE token_digest = $1 AND expires_at > now()",
        )
        .bind(token_digest(token))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }
}

/// The already-authenticated caller, resolved from the `Authorization`
/// header. Everything behind this extractor only ever sees the user id;
/// credential handling stays in `AuthService`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))?;

        let auth = AuthService::new(state.db.clone(), state.config.session_ttl_secs);
        let user_id = auth.resolve_token(token).await?;
        Ok(CurrentUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let a = token_digest("some-token");
        let b = token_digest("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_differs_per_token() {
        assert_ne!(token_digest("token-a"), token_digest("token-b"));
    }

    #[test]
    fn bcrypt_round_trip() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
        assert!(!bcrypt::verify("hunter3", &hash).unwrap());
    }
}
