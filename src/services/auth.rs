//! Admin authentication: password check, sessions and JWTs

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::admin::{AdminClaims, AdminUser},
    repository::Repository,
};

/// Successful login
#[derive(Debug)]
pub struct AdminSession {
    pub token: String,
    pub admin: AdminUser,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AdminSession> {
        let credentials = self
            .repository
            .admins
            .credentials_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&credentials.password_hash, password)? {
            tracing::warn!(username = %credentials.username, "admin login rejected");
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let purged = self.repository.admins.purge_expired_sessions().await?;
        if purged > 0 {
            tracing::debug!(purged, "expired admin sessions removed");
        }

        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.jwt_expiration_hours as i64);
        let session_id = self
            .repository
            .admins
            .create_session(credentials.id, expires_at)
            .await?;
        self.repository.admins.touch_last_login(credentials.id).await?;
        let admin = self.repository.admins.get_by_id(credentials.id).await?;

        let claims = AdminClaims {
            sub: admin.username.clone(),
            user_id: admin.id,
            role: admin.role.clone(),
            sid: session_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(admin_id = admin.id, username = %admin.username, "admin logged in");
        Ok(AdminSession {
            token,
            admin,
            expires_at,
        })
    }

    /// Decode a token and check its session is still open
    pub async fn validate(&self, token: &str) -> AppResult<AdminClaims> {
        let claims = AdminClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        if !self
            .repository
            .admins
            .session_is_valid(claims.sid, claims.user_id)
            .await?
        {
            return Err(AppError::Authentication("Session expired".to_string()));
        }
        Ok(claims)
    }

    pub async fn current_admin(&self, claims: &AdminClaims) -> AppResult<AdminUser> {
        self.repository.admins.get_by_id(claims.user_id).await
    }

    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        self.repository.admins.delete_session(session_id).await?;
        tracing::info!(session_id = %session_id, "admin logged out");
        Ok(())
    }

    /// Create the configured admin when no admin exists yet
    pub async fn bootstrap_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_admin_username.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.admins.count().await? > 0 {
            return Ok(());
        }

        let hash = hash_password(password)?;
        let admin = self.repository.admins.create(username, &hash, "admin").await?;
        tracing::info!(admin_id = admin.id, username = %admin.username, "bootstrap admin created");
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
