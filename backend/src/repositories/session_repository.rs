//! Database repository for login sessions.

use crate::database::models::Session;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING token, user_id, expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Deletes sessions past their expiry. Returns the number removed.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        // Timestamps are stored as RFC 3339 UTC text, which sorts chronologically.
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Drops every session of a user, e.g. after a password change.
    pub async fn delete_sessions_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateUser;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::create_user(
            &mut conn,
            CreateUser {
                username: "a@example.com".to_string(),
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        drop(conn);

        let repo = SessionRepository::new(&pool);
        let expires_at = Utc::now() + Duration::hours(1);
        repo.create_session("t1", &user.id, expires_at).await.unwrap();
        repo.create_session("t2", &user.id, expires_at).await.unwrap();

        let session = repo.get_session("t1").await.unwrap().unwrap();
        assert_eq!(session.user_id, user.id);

        repo.delete_session("t1").await.unwrap();
        assert!(repo.get_session("t1").await.unwrap().is_none());

        let mut conn = pool.acquire().await.unwrap();
        let removed = SessionRepository::delete_sessions_for_user(&mut conn, &user.id)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        drop(conn);
        assert!(repo.get_session("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::create_user(
            &mut conn,
            CreateUser {
                username: "a@example.com".to_string(),
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        drop(conn);

        let repo = SessionRepository::new(&pool);
        repo.create_session("old", &user.id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        repo.create_session("new", &user.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(repo.get_session("old").await.unwrap().is_none());
        assert!(repo.get_session("new").await.unwrap().is_some());
    }
}
