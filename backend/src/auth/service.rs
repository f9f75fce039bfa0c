//! Core business logic for the authentication system.

use crate::auth::models::{LoginForm, LoginOutcome};
use crate::config::Config;
use crate::database::models::User;
use crate::errors::ServiceResult;
use crate::repositories::session_repository::SessionRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::generate_random_string::generate_random_string;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

const SESSION_TOKEN_LENGTH: usize = 48;

/// Authentication service for handling login, logout and session lookup
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    config: &'a Config,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        AuthService { pool, config }
    }

    /// Maps an identifier (username or email) and a password to a user.
    ///
    /// Returns `Ok(None)` when no account matches or the password is wrong.
    /// Store failures are returned as errors, not folded into `None`.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> ServiceResult<Option<User>> {
        let repo = UserRepository::new(self.pool);
        let Some(user) = repo.get_user_by_login(identifier).await? else {
            return Ok(None);
        };

        match UserService::verify_password(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Stored password hash is unusable: {}", e);
                Ok(None)
            }
        }
    }

    /// Authenticate the form's credentials and open a session for an active user.
    ///
    /// The form is expected to be validated by the caller.
    pub async fn login(&self, form: &LoginForm) -> ServiceResult<LoginOutcome> {
        let Some(user) = self.authenticate(&form.username, &form.password).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if !user.is_active {
            return Ok(LoginOutcome::Inactive);
        }

        let expires_at = Utc::now() + Duration::seconds(self.config.session_ttl_seconds);
        let session = SessionRepository::new(self.pool)
            .create_session(
                &generate_random_string(SESSION_TOKEN_LENGTH),
                &user.id,
                expires_at,
            )
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome::LoggedIn { user, session })
    }

    /// Ends the session identified by `token`.
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        SessionRepository::new(self.pool).delete_session(token).await?;
        Ok(())
    }

    /// Removes every expired session.
    pub async fn purge_expired_sessions(&self) -> ServiceResult<u64> {
        let removed = SessionRepository::new(self.pool)
            .delete_expired(Utc::now())
            .await?;
        Ok(removed)
    }

    /// Resolves a session token to its user. Expired sessions are removed.
    pub async fn session_user(&self, token: &str) -> ServiceResult<Option<User>> {
        let sessions = SessionRepository::new(self.pool);
        let Some(session) = sessions.get_session(token).await? else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            sessions.delete_session(&session.token).await?;
            return Ok(None);
        }

        let user = UserRepository::new(self.pool)
            .get_user_by_id(&session.user_id)
            .await?;
        Ok(user)
    }
}
