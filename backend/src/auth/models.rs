//! Data structures for authentication-related requests and outcomes.

use crate::database::models::{Session, User};
use serde::Deserialize;
use validator::Validate;

/// Login form payload. `username` accepts a username or an email address.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

/// What happened to a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn { user: User, session: Session },
    Inactive,
    InvalidCredentials,
}

/// The user behind the request's session cookie, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub user: Option<User>,
    pub session_token: Option<String>,
}
