//! Database repository for email verification records.
//!
//! A record binds a single-use code to an email address and a purpose.
//! Consumption is a single conditional update on `consumed_at`, so a code
//! can be spent at most once even under concurrent requests.

use crate::database::models::{
    CreateVerificationRecord, VerificationPurpose, VerificationRecord,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, code, email, purpose, created_at, expires_at, consumed_at";

/// Repository for verification record database operations.
pub struct VerificationRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> VerificationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a freshly issued code.
    pub async fn create_record(
        &self,
        record: CreateVerificationRecord,
    ) -> Result<VerificationRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::create_record_in(&mut conn, record).await
    }

    /// Same as [`Self::create_record`] but on an open connection or transaction.
    pub async fn create_record_in(
        conn: &mut SqliteConnection,
        record: CreateVerificationRecord,
    ) -> Result<VerificationRecord> {
        let record = sqlx::query_as::<_, VerificationRecord>(&format!(
            r#"
            INSERT INTO verification_records (id, code, email, purpose, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&record.code)
        .bind(&record.email)
        .bind(record.purpose)
        .bind(Utc::now())
        .bind(record.expires_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Retrieves a record by its code, whatever its state.
    pub async fn get_record_by_code(&self, code: &str) -> Result<Option<VerificationRecord>> {
        let record = sqlx::query_as::<_, VerificationRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM verification_records WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Same as [`Self::get_record_by_code`] but on an open connection or transaction.
    pub async fn get_record_by_code_in(
        conn: &mut SqliteConnection,
        code: &str,
    ) -> Result<Option<VerificationRecord>> {
        let record = sqlx::query_as::<_, VerificationRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM verification_records WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Marks the unused record with this code and purpose as consumed.
    ///
    /// The check and the write are one statement, so the first writer holds
    /// the database lock and a concurrent caller sees the record as used.
    ///
    /// # Returns
    /// The consumed record, or `None` if no unused record matches.
    pub async fn consume_code(
        conn: &mut SqliteConnection,
        code: &str,
        purpose: VerificationPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>> {
        let record = sqlx::query_as::<_, VerificationRecord>(&format!(
            r#"
            UPDATE verification_records SET consumed_at = ?
            WHERE code = ? AND purpose = ? AND consumed_at IS NULL
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(code)
        .bind(purpose)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Deletes records that were used or have expired. Returns the number removed.
    pub async fn delete_stale(&self, now: DateTime<Utc>) -> Result<u64> {
        // Timestamps are stored as RFC 3339 UTC text, which sorts chronologically.
        let rows_affected = sqlx::query(
            "DELETE FROM verification_records WHERE consumed_at IS NOT NULL OR expires_at <= ?",
        )
        .bind(now)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::Duration;

    fn new_record(code: &str, purpose: VerificationPurpose) -> CreateVerificationRecord {
        CreateVerificationRecord {
            code: code.to_string(),
            email: "a@example.com".to_string(),
            purpose,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = test_pool().await;
        let repo = VerificationRepository::new(&pool);

        let created = repo
            .create_record(new_record("abc", VerificationPurpose::Forget))
            .await
            .unwrap();
        assert_eq!(created.purpose, VerificationPurpose::Forget);
        assert!(created.consumed_at.is_none());

        let found = repo.get_record_by_code("abc").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "a@example.com");
        assert!(repo.get_record_by_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_codes_are_unique() {
        let pool = test_pool().await;
        let repo = VerificationRepository::new(&pool);

        repo.create_record(new_record("dup", VerificationPurpose::Register))
            .await
            .unwrap();
        assert!(
            repo.create_record(new_record("dup", VerificationPurpose::Forget))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_consume_code_only_once() {
        let pool = test_pool().await;
        let repo = VerificationRepository::new(&pool);
        repo.create_record(new_record("once", VerificationPurpose::Register))
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let wrong_purpose = VerificationRepository::consume_code(
            &mut conn,
            "once",
            VerificationPurpose::Forget,
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(wrong_purpose.is_none());

        let consumed = VerificationRepository::consume_code(
            &mut conn,
            "once",
            VerificationPurpose::Register,
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(consumed.is_consumed());

        let again = VerificationRepository::consume_code(
            &mut conn,
            "once",
            VerificationPurpose::Register,
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_delete_stale() {
        let pool = test_pool().await;
        let repo = VerificationRepository::new(&pool);
        repo.create_record(new_record("live", VerificationPurpose::Register))
            .await
            .unwrap();
        repo.create_record(CreateVerificationRecord {
            expires_at: Utc::now() - Duration::seconds(1),
            ..new_record("expired", VerificationPurpose::Forget)
        })
        .await
        .unwrap();
        repo.create_record(new_record("used", VerificationPurpose::Forget))
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        VerificationRepository::consume_code(&mut conn, "used", VerificationPurpose::Forget, Utc::now())
            .await
            .unwrap()
            .unwrap();
        drop(conn);

        assert_eq!(repo.delete_stale(Utc::now()).await.unwrap(), 2);
        assert!(repo.get_record_by_code("live").await.unwrap().is_some());
        assert!(repo.get_record_by_code("expired").await.unwrap().is_none());
        assert!(repo.get_record_by_code("used").await.unwrap().is_none());
    }
}
