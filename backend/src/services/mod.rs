//! Module for core business logic services.
//!
//! This module encapsulates the account operations (registration,
//! activation, password reset), the verification code lifecycle and
//! outbound mail.

pub mod email_service;
pub mod user_service;
pub mod verification_service;
