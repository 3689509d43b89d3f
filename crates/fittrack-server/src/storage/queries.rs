//! User queries.

use fittrack_auth::VerifiedIdentity;
use fittrack_core::db::{DatabaseError, unix_timestamp};

use super::db::ServerDatabase;
use super::models::User;

impl ServerDatabase {
    /// Get a user by Telegram id.
    pub async fn get_user(&self, telegram_id: i64) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {telegram_id}")))
    }

    pub async fn user_exists(&self, telegram_id: i64) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Insert the user, or refresh the profile fields of an existing row.
    ///
    /// `created_at` is kept from the first insert. Returns `true` when a new
    /// row was created.
    pub async fn upsert_user(&self, identity: &VerifiedIdentity) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            "INSERT INTO users \
                 (telegram_id, first_name, username, language_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(telegram_id) DO NOTHING",
        )
        .bind(identity.id)
        .bind(&identity.first_name)
        .bind(identity.username.as_deref())
        .bind(identity.language_code.as_deref())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let inserted = result.rows_affected() > 0;

        if !inserted {
            sqlx::query(
                "UPDATE users SET first_name = ?, username = ?, language_code = ?, updated_at = ? \
                 WHERE telegram_id = ?",
            )
            .bind(&identity.first_name)
            .bind(identity.username.as_deref())
            .bind(identity.language_code.as_deref())
            .bind(now)
            .bind(identity.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Delete a user. Returns `false` if there was no such user.
    pub async fn delete_user(&self, telegram_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
