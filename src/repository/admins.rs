//! Admin accounts and sessions repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::admin::{AdminCredentials, AdminUser},
};

#[derive(Clone)]
pub struct AdminsRepository {
    pool: Pool<Postgres>,
}

impl AdminsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Credentials of an active admin
    pub async fn credentials_by_username(&self, username: &str) -> AppResult<Option<AdminCredentials>> {
        let row = sqlx::query_as::<_, AdminCredentials>(
            r#"
            SELECT id, username, password_hash
            FROM admin_users
            WHERE username = $1 AND is_active = TRUE
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<AdminUser> {
        sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, username, email, full_name, role, is_active, last_login
            FROM admin_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", id)))
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create(&self, username: &str, password_hash: &str, role: &str) -> AppResult<AdminUser> {
        sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, full_name, role, is_active, last_login
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, &format!("Admin {} already exists", username)))
    }

    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE admin_users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_session(&self, user_id: i32, expires_at: DateTime<Utc>) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO admin_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Whether the session exists, is unexpired and belongs to an active admin
    pub async fn session_is_valid(&self, session_id: Uuid, user_id: i32) -> AppResult<bool> {
        let valid = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM admin_sessions s
                JOIN admin_users u ON u.id = s.user_id
                WHERE s.id = $1 AND s.user_id = $2
                  AND s.expires_at > NOW()
                  AND u.is_active = TRUE
            )
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(valid)
    }

    pub async fn delete_session(&self, session_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
