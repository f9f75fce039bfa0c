//! Database repository for user management operations.
//!
//! Provides the persistence operations behind registration, login,
//! activation and password reset.

use crate::database::models::{CreateUser, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new, inactive user.
    ///
    /// Uniqueness of `username` and `email` is decided by the table
    /// constraints in the same statement; a duplicate surfaces as a unique
    /// violation (see [`is_unique_violation`]).
    ///
    /// Runs on the caller's connection so the insert can share a
    /// transaction with the account's first verification record.
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(conn: &mut SqliteConnection, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(false)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves the user whose username or email equals `identifier`.
    ///
    /// If one row matches by username and another by email, the username
    /// match wins.
    pub async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username = ? OR email = ?
            ORDER BY CASE WHEN username = ? THEN 0 ELSE 1 END
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Marks the user owning `email` as active. Returns the number of rows changed.
    pub async fn activate_by_email(
        conn: &mut SqliteConnection,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let rows_affected =
            sqlx::query("UPDATE users SET is_active = 1, updated_at = ? WHERE email = ?")
                .bind(now)
                .bind(email)
                .execute(&mut *conn)
                .await?
                .rows_affected();

        Ok(rows_affected)
    }

    /// Stores a new password hash for the user owning `email`.
    /// Returns the id of the updated user, if any.
    pub async fn update_password_by_email(
        conn: &mut SqliteConnection,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let id: Option<String> = sqlx::query_scalar(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE email = ? RETURNING id",
        )
        .bind(password_hash)
        .bind(now)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(id)
    }
}

/// Returns `true` if the error was raised by a UNIQUE constraint.
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_error)) if db_error.is_unique_violation()
    )
}
