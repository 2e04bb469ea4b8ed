//! Repository for the `users` table.

use helpdesk_core::types::UserId;
use sqlx::PgPool;

use crate::models::user::{NewUser, UserRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "tg_id, position, registered_at, profile";

/// The stored profile with the legacy `organization_adress` key folded
/// into `organization_address`. Every profile write starts from this.
const CANONICAL_PROFILE: &str = "(profile - 'organization_adress') || jsonb_build_object(
         'organization_address',
         COALESCE(profile -> 'organization_address', profile -> 'organization_adress', to_jsonb('no data'::text)))";

/// Provides reads and writes for users, their position and their profile.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Fails with a unique violation if the id is already registered.
    pub async fn create(pool: &PgPool, input: &NewUser) -> Result<UserRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (tg_id, position, registered_at, profile)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(input.id)
            .bind(input.position.to_string())
            .bind(input.registered_at)
            .bind(input.profile.to_json())
            .fetch_one(pool)
            .await
    }

    /// Find a user by chat id.
    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE tg_id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the stored position. Returns `true` if the user exists.
    pub async fn update_position(
        pool: &PgPool,
        id: UserId,
        position: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET position = $2 WHERE tg_id = $1")
            .bind(id)
            .bind(position)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Read a single profile key.
    ///
    /// The outer `Option` is `None` when the user does not exist; the inner
    /// one is `None` when the key is missing from the stored object.
    pub async fn get_profile_field(
        pool: &PgPool,
        id: UserId,
        key: &str,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>("SELECT profile ->> $2 FROM users WHERE tg_id = $1")
            .bind(id)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Set a single profile key in one statement. A legacy
    /// `organization_adress` value is moved to `organization_address` in the
    /// same write, so the object never carries both spellings.
    ///
    /// Returns `true` if the user exists.
    pub async fn set_profile_field(
        pool: &PgPool,
        id: UserId,
        key: &str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET profile = jsonb_set({CANONICAL_PROFILE}, ARRAY[$2::text], to_jsonb($3::text), true)
             WHERE tg_id = $1"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store the latest-ticket summary (`history_ticket`, `data_ticket`,
    /// `user_name`) in one statement.
    pub async fn record_latest_ticket(
        pool: &PgPool,
        id: UserId,
        history_ticket: &str,
        data_ticket: &str,
        user_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET profile = {CANONICAL_PROFILE} || jsonb_build_object(
                 'history_ticket', $2::text,
                 'data_ticket', $3::text,
                 'user_name', $4::text)
             WHERE tg_id = $1"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(history_ticket)
            .bind(data_ticket)
            .bind(user_name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
