//! Admin accounts, sessions and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Admin account without its password hash
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// Admin row including the password hash (never serialized)
#[derive(Debug, Clone, FromRow)]
pub struct AdminCredentials {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// JWT claims for an authenticated admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: String,
    /// Server-side session id, checked on every request
    pub sid: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(expires_in: Duration) -> AdminClaims {
        let now = Utc::now();
        AdminClaims {
            sub: "admin".into(),
            user_id: 1,
            role: "admin".into(),
            sid: Uuid::new_v4(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let original = claims(Duration::hours(1));
        let token = original.create_token("secret").unwrap();
        let decoded = AdminClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.sid, original.sid);
        assert_eq!(decoded.user_id, 1);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = claims(Duration::hours(1)).create_token("secret").unwrap();
        assert!(AdminClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = claims(Duration::hours(-2)).create_token("secret").unwrap();
        assert!(AdminClaims::from_token(&token, "secret").is_err());
    }
}
