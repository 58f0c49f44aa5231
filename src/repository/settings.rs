//! Admin settings repository (singleton row, id = 1)

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::AdminSettings,
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> AppResult<AdminSettings> {
        sqlx::query_as::<_, AdminSettings>(
            "SELECT booking_enabled, go_date, return_date FROM admin_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal("admin settings row is missing".to_string()))
    }

    /// Read and lock the settings row for the rest of the transaction
    pub async fn lock_on(conn: &mut PgConnection) -> AppResult<AdminSettings> {
        sqlx::query_as::<_, AdminSettings>(
            "SELECT booking_enabled, go_date, return_date FROM admin_settings WHERE id = 1 FOR UPDATE",
        )
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::Internal("admin settings row is missing".to_string()))
    }

    pub async fn upsert_on(conn: &mut PgConnection, settings: &AdminSettings) -> AppResult<AdminSettings> {
        let row = sqlx::query_as::<_, AdminSettings>(
            r#"
            INSERT INTO admin_settings (id, booking_enabled, go_date, return_date, updated_at)
            VALUES (1, $1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE
            SET booking_enabled = EXCLUDED.booking_enabled,
                go_date = EXCLUDED.go_date,
                return_date = EXCLUDED.return_date,
                updated_at = NOW()
            RETURNING booking_enabled, go_date, return_date
            "#,
        )
        .bind(settings.booking_enabled)
        .bind(settings.go_date)
        .bind(settings.return_date)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
