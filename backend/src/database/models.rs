//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Form payloads submitted by the pages live next to the
//! handlers that accept them.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// What a verification code was issued for.
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum VerificationPurpose {
    Register,
    Forget,
}

impl std::fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationPurpose::Register => write!(f, "register"),
            VerificationPurpose::Forget => write!(f, "forget"),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationRecord {
    pub id: String,
    pub code: String,
    pub email: String,
    pub purpose: VerificationPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CreateVerificationRecord {
    pub code: String,
    pub email: String,
    pub purpose: VerificationPurpose,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>, consumed_at: Option<DateTime<Utc>>) -> VerificationRecord {
        VerificationRecord {
            id: "id".to_string(),
            code: "code".to_string(),
            email: "a@example.com".to_string(),
            purpose: VerificationPurpose::Register,
            created_at: Utc::now(),
            expires_at,
            consumed_at,
        }
    }

    #[test]
    fn test_purpose_text_form() {
        assert_eq!(VerificationPurpose::Register.to_string(), "register");
        assert_eq!(VerificationPurpose::Forget.to_string(), "forget");
    }

    #[test]
    fn test_record_expiry_and_consumption() {
        let now = Utc::now();
        let live = record(now + Duration::minutes(5), None);
        assert!(!live.is_expired(now));
        assert!(!live.is_consumed());

        let stale = record(now - Duration::seconds(1), Some(now));
        assert!(stale.is_expired(now));
        assert!(stale.is_consumed());
    }
}
