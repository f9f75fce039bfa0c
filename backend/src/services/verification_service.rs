//! Verification code lifecycle: issue, look up, consume.
//!
//! Codes are single-use and expire after `VERIFICATION_CODE_TTL_SECONDS`.
//! A code only counts for the purpose it was issued for, so a password
//! reset code cannot activate an account and vice versa.

use crate::config::Config;
use crate::database::models::{CreateVerificationRecord, VerificationPurpose, VerificationRecord};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::verification_repository::VerificationRepository;
use crate::services::email_service::{EmailService, Mailer};
use crate::utils::generate_random_string::generate_random_string;
use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};

pub struct VerificationService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    config: &'a Config,
    mailer: &'a dyn Mailer,
}

impl<'a> VerificationService<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a Config, mailer: &'a dyn Mailer) -> Self {
        Self {
            pool,
            config,
            mailer,
        }
    }

    /// A fresh random code for `email`, valid for the configured lifetime.
    pub fn new_record(
        config: &Config,
        email: &str,
        purpose: VerificationPurpose,
    ) -> CreateVerificationRecord {
        CreateVerificationRecord {
            code: generate_random_string(config.verification_code_length),
            email: email.to_string(),
            purpose,
            expires_at: Utc::now() + Duration::seconds(config.verification_code_ttl_seconds),
        }
    }

    /// Issues a new code for `email` and mails the matching link.
    pub async fn issue(
        &self,
        email: &str,
        purpose: VerificationPurpose,
    ) -> ServiceResult<VerificationRecord> {
        let repo = VerificationRepository::new(self.pool);
        let record = repo
            .create_record(Self::new_record(self.config, email, purpose))
            .await?;

        self.deliver(&record).await;

        Ok(record)
    }

    /// Mails the link for a stored record.
    ///
    /// A delivery failure is logged and leaves the record valid; the user can
    /// request another code.
    pub async fn deliver(&self, record: &VerificationRecord) {
        let email_service = EmailService::new(self.mailer, self.config);
        match email_service
            .send_verification_email(&record.email, &record.code, record.purpose)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    purpose = %record.purpose,
                    "Verification email sent to {}",
                    record.email
                );
            }
            Err(e) => {
                tracing::error!(
                    purpose = %record.purpose,
                    "Failed to send verification email to {}: {}",
                    record.email,
                    e
                );
            }
        }
    }

    /// Returns the record for `code` if it can still be used for `purpose`.
    /// Does not consume it.
    pub async fn lookup(
        &self,
        code: &str,
        purpose: VerificationPurpose,
    ) -> ServiceResult<Option<VerificationRecord>> {
        let repo = VerificationRepository::new(self.pool);
        let record = repo.get_record_by_code(code).await?;

        Ok(record.filter(|record| ensure_usable(record, purpose, Utc::now()).is_ok()))
    }

    /// Spends `code` for `purpose` on the given connection.
    ///
    /// Must run inside the transaction that applies the code's effect: an
    /// expired code is marked before the expiry check fails, and rolling
    /// back the transaction leaves it as it was.
    ///
    /// # Errors
    /// - `NotFound` if no record has this code or it was issued for another purpose
    /// - `InvalidOperation` if it expired or was already used
    pub async fn consume(
        conn: &mut SqliteConnection,
        code: &str,
        purpose: VerificationPurpose,
        now: DateTime<Utc>,
    ) -> ServiceResult<VerificationRecord> {
        let Some(record) = VerificationRepository::consume_code(conn, code, purpose, now).await?
        else {
            let existing = VerificationRepository::get_record_by_code_in(conn, code).await?;
            return Err(match existing {
                Some(record) => ensure_usable(&record, purpose, now)
                    .err()
                    .unwrap_or_else(already_used),
                None => ServiceError::not_found("Verification code", code),
            });
        };

        ensure_fresh(&record, now)?;
        Ok(record)
    }

    /// Removes used and expired records.
    pub async fn purge_stale(&self) -> ServiceResult<u64> {
        let removed = VerificationRepository::new(self.pool)
            .delete_stale(Utc::now())
            .await?;
        Ok(removed)
    }
}

fn already_used() -> ServiceError {
    ServiceError::invalid_operation("Verification code has already been used")
}

fn ensure_fresh(record: &VerificationRecord, now: DateTime<Utc>) -> ServiceResult<()> {
    if record.is_expired(now) {
        return Err(ServiceError::invalid_operation(
            "Verification code has expired",
        ));
    }
    Ok(())
}

fn ensure_usable(
    record: &VerificationRecord,
    purpose: VerificationPurpose,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    if record.purpose != purpose {
        return Err(ServiceError::not_found("Verification code", &record.code));
    }
    if record.is_consumed() {
        return Err(already_used());
    }
    ensure_fresh(record, now)
}
