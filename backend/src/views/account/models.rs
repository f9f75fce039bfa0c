//! Form payloads for the account pages.
//!
//! Every field defaults to empty so that a missing field is reported by
//! validation on the re-rendered form rather than rejected by the extractor.

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ForgetForm {
    #[serde(default)]
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,
}

/// New password submission from the reset page.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ModifyPasswordForm {
    #[serde(default)]
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password1: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password2: String,
}

impl ModifyPasswordForm {
    pub fn passwords_match(&self) -> bool {
        self.password1 == self.password2
    }
}
