//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, public site URL, verification code policy,
//! session lifetime and the optional SMTP relay used for outbound mail.

use anyhow::{Context, Result, bail};
use std::env;

/// Shortest verification code accepted from configuration.
pub const MIN_VERIFICATION_CODE_LENGTH: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    /// Public base URL used to build links in outbound mail, without trailing slash.
    pub site_url: String,
    pub site_name: String,
    pub verification_code_length: usize,
    pub verification_code_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub session_cookie_secure: bool,
    pub password_hash_cost: u32,
    pub email: Option<EmailConfig>,
}

/// SMTP relay settings. Absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let site_name = env::var("SITE_NAME").unwrap_or_else(|_| "MuXue Online".to_string());

        let verification_code_length = env::var("VERIFICATION_CODE_LENGTH")
            .unwrap_or_else(|_| "32".to_string())
            .parse::<usize>()
            .context("VERIFICATION_CODE_LENGTH must be a valid number")?;
        if verification_code_length < MIN_VERIFICATION_CODE_LENGTH {
            bail!(
                "VERIFICATION_CODE_LENGTH must be at least {}",
                MIN_VERIFICATION_CODE_LENGTH
            );
        }

        let verification_code_ttl_seconds = env::var("VERIFICATION_CODE_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<i64>()
            .context("VERIFICATION_CODE_TTL_SECONDS must be a valid number")?;

        let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "1209600".to_string())
            .parse::<i64>()
            .context("SESSION_TTL_SECONDS must be a valid number")?;

        let session_cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .context("SESSION_COOKIE_SECURE must be true or false")?;

        let password_hash_cost = match env::var("PASSWORD_HASH_COST") {
            Ok(value) => value
                .parse::<u32>()
                .context("PASSWORD_HASH_COST must be a valid number")?,
            Err(_) => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&password_hash_cost) {
            bail!("PASSWORD_HASH_COST must be between 4 and 31");
        }

        let email = EmailConfig::from_env()?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            site_url,
            site_name,
            verification_code_length,
            verification_code_ttl_seconds,
            session_ttl_seconds,
            session_cookie_secure,
            password_hash_cost,
            email,
        })
    }

    /// Returns the SMTP settings if outbound mail is configured.
    pub fn email_config(&self) -> Option<EmailConfig> {
        self.email.clone()
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>> {
        let Ok(smtp_host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        let smtp_username = env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?;
        let smtp_password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?;
        let from_email = env::var("EMAIL_FROM").context("EMAIL_FROM not set")?;
        let from_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "MuXue Online".to_string());

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
        }))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 3,
        server_port: 8000,
        site_url: "http://127.0.0.1:8000".to_string(),
        site_name: "MuXue Online".to_string(),
        verification_code_length: 32,
        verification_code_ttl_seconds: 3600,
        session_ttl_seconds: 3600,
        session_cookie_secure: false,
        password_hash_cost: 4,
        email: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: [(&str, Option<&str>); 12] = [
        ("DB_MAX_CONNECTIONS", None),
        ("DB_ACQUIRE_TIMEOUT_SECONDS", None),
        ("SERVER_PORT", None),
        ("SITE_URL", None),
        ("SITE_NAME", None),
        ("VERIFICATION_CODE_LENGTH", None),
        ("VERIFICATION_CODE_TTL_SECONDS", None),
        ("SESSION_TTL_SECONDS", None),
        ("SESSION_COOKIE_SECURE", None),
        ("PASSWORD_HASH_COST", None),
        ("SMTP_HOST", None),
        ("EMAIL_FROM", None),
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = UNSET
            .iter()
            .filter(|(key, _)| !vars.iter().any(|(k, _)| k == key))
            .copied()
            .collect();
        all.extend_from_slice(vars);
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[("DATABASE_URL", Some("sqlite://accounts.db"))], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.database_url, "sqlite://accounts.db");
            assert_eq!(config.server_port, 8000);
            assert_eq!(config.site_url, "http://127.0.0.1:8000");
            assert_eq!(config.verification_code_length, 32);
            assert_eq!(config.verification_code_ttl_seconds, 86400);
            assert_eq!(config.password_hash_cost, bcrypt::DEFAULT_COST);
            assert!(!config.session_cookie_secure);
            assert!(config.email_config().is_none());
        });
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        with_env(
            &[
                ("DATABASE_URL", Some("sqlite://accounts.db")),
                ("SITE_URL", Some("https://muxue.example/")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.site_url, "https://muxue.example");
            },
        );
    }

    #[test]
    fn test_missing_database_url() {
        with_env(&[("DATABASE_URL", None)], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_short_code_length_rejected() {
        with_env(
            &[
                ("DATABASE_URL", Some("sqlite://accounts.db")),
                ("VERIFICATION_CODE_LENGTH", Some("8")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_smtp_config() {
        with_env(
            &[
                ("DATABASE_URL", Some("sqlite://accounts.db")),
                ("SMTP_HOST", Some("smtp.example.com")),
                ("SMTP_PORT", Some("465")),
                ("SMTP_USERNAME", Some("mailer")),
                ("SMTP_PASSWORD", Some("secret")),
                ("EMAIL_FROM", Some("noreply@example.com")),
            ],
            || {
                let email = Config::from_env().unwrap().email_config().unwrap();
                assert_eq!(email.smtp_host, "smtp.example.com");
                assert_eq!(email.smtp_port, 465);
                assert_eq!(email.from_email, "noreply@example.com");
            },
        );
    }
}
