//! User business logic service.
//!
//! Handles registration, activation and password reset, plus password
//! hashing and verification.

use crate::config::Config;
use crate::database::models::{CreateUser, User, VerificationPurpose, VerificationRecord};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::session_repository::SessionRepository;
use crate::repositories::user_repository::{UserRepository, is_unique_violation};
use crate::repositories::verification_repository::VerificationRepository;
use crate::services::verification_service::VerificationService;
use bcrypt::{hash, verify};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    config: &'a Config,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        Self { pool, config }
    }

    /// Creates an inactive account whose username is its email, together
    /// with its first activation code.
    ///
    /// Both rows are written in one transaction, so an account never exists
    /// without a way to activate it. The insert itself enforces email
    /// uniqueness, so two concurrent registrations for the same address
    /// cannot both succeed. Mailing the code is left to the caller.
    ///
    /// # Errors
    /// Returns `ServiceError::AlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<(User, VerificationRecord)> {
        let password_hash = self.hash_password(password)?;

        let mut tx = self.pool.begin().await?;
        let user = UserRepository::create_user(
            &mut tx,
            CreateUser {
                username: email.to_string(),
                email: email.to_string(),
                password_hash,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::already_exists("User with email", email)
            } else {
                ServiceError::Database { source: e }
            }
        })?;

        let record = VerificationRepository::create_record_in(
            &mut tx,
            VerificationService::new_record(self.config, email, VerificationPurpose::Register),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, "Registered new account for {}", user.email);
        Ok((user, record))
    }

    /// Returns whether `email` belongs to an account that is not active yet.
    pub async fn awaiting_activation(&self, email: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        let user = repo.get_user_by_email(email).await?;
        Ok(user.is_some_and(|user| !user.is_active))
    }

    /// Spends a register code and activates the account it was issued for.
    ///
    /// # Returns
    /// The email address that was activated.
    pub async fn activate(&self, code: &str) -> ServiceResult<String> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let record =
            VerificationService::consume(&mut tx, code, VerificationPurpose::Register, now).await?;

        let rows_affected = UserRepository::activate_by_email(&mut tx, &record.email, now).await?;
        if rows_affected == 0 {
            return Err(ServiceError::not_found("User with email", &record.email));
        }

        tx.commit().await?;

        tracing::info!("Activated account for {}", record.email);
        Ok(record.email)
    }

    /// Spends a forget code and stores a new password for its email.
    ///
    /// `email` is the address the reset form was rendered for; it must match
    /// the address the code was issued to. All sessions of the user are
    /// dropped.
    pub async fn reset_password(
        &self,
        code: &str,
        email: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let password_hash = self.hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let record =
            VerificationService::consume(&mut tx, code, VerificationPurpose::Forget, now).await?;
        if record.email != email {
            return Err(ServiceError::permission_denied(
                "Verification code was not issued for this email",
            ));
        }

        let user_id =
            UserRepository::update_password_by_email(&mut tx, &record.email, &password_hash, now)
                .await?
                .ok_or_else(|| ServiceError::not_found("User with email", &record.email))?;

        let dropped = SessionRepository::delete_sessions_for_user(&mut tx, &user_id).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            sessions_dropped = dropped,
            "Password reset for {}",
            record.email
        );
        Ok(())
    }

    /// Returns whether an account exists for `email`.
    pub async fn email_registered(&self, email: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        Ok(repo.get_user_by_email(email).await?.is_some())
    }

    /// Function to hash a password before storing in database
    ///
    /// # Errors
    /// Returns `ServiceError` if hashing fails
    pub fn hash_password(&self, password: &str) -> ServiceResult<String> {
        hash(password, self.config.password_hash_cost)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Function to verify a password against the stored hash
    ///
    /// # Returns
    /// `true` if password matches hash, `false` otherwise
    ///
    /// # Errors
    /// Returns `ServiceError` if the stored hash cannot be parsed
    pub fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
        verify(password, hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {}", e)))
    }
}
