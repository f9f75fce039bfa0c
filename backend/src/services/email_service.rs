//! Outbound mail.
//!
//! `EmailService` builds the verification emails (activation and password
//! reset links) and hands them to a [`Mailer`]. The production mailer relays
//! through SMTP with lettre; without SMTP settings the messages are only logged.

use crate::config::{Config, EmailConfig};
use crate::database::models::VerificationPurpose;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;
use std::sync::Arc;

/// A fully rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivery backend for outbound mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> ServiceResult<()>;
}

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl SmtpMailer {
    /// Creates a new SmtpMailer instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(&email.to)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Writes outbound mail to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> ServiceResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "SMTP not configured, email not delivered:\n{}",
            email.text_body
        );
        Ok(())
    }
}

/// Picks the mailer for the given configuration.
pub fn mailer_from_config(config: &Config) -> Arc<dyn Mailer> {
    match config.email_config() {
        Some(email_config) => match SmtpMailer::new(email_config) {
            Ok(mailer) => {
                tracing::info!("Email service initialized successfully");
                Arc::new(mailer)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize email service: {}. Emails will only be logged.",
                    e
                );
                Arc::new(LogMailer)
            }
        },
        None => {
            tracing::warn!("Email configuration not found. Emails will only be logged.");
            Arc::new(LogMailer)
        }
    }
}

/// Builds and sends the site's verification emails.
pub struct EmailService<'a> {
    mailer: &'a dyn Mailer,
    site_url: &'a str,
    site_name: &'a str,
}

impl<'a> EmailService<'a> {
    pub fn new(mailer: &'a dyn Mailer, config: &'a Config) -> Self {
        Self {
            mailer,
            site_url: &config.site_url,
            site_name: &config.site_name,
        }
    }

    /// Sends the link for a freshly issued verification code.
    pub async fn send_verification_email(
        &self,
        recipient_email: &str,
        code: &str,
        purpose: VerificationPurpose,
    ) -> ServiceResult<()> {
        let email = self.build_verification_email(recipient_email, code, purpose);
        self.mailer.send(&email).await
    }

    /// Link embedded in the email for a code.
    pub fn verification_url(&self, code: &str, purpose: VerificationPurpose) -> String {
        match purpose {
            VerificationPurpose::Register => format!("{}/active/{}", self.site_url, code),
            VerificationPurpose::Forget => format!("{}/reset/{}", self.site_url, code),
        }
    }

    fn build_verification_email(
        &self,
        recipient_email: &str,
        code: &str,
        purpose: VerificationPurpose,
    ) -> OutgoingEmail {
        let url = self.verification_url(code, purpose);
        let (subject, action, button) = match purpose {
            VerificationPurpose::Register => (
                format!("{} account activation link", self.site_name),
                "Please click the link below to activate your account:",
                "Activate account",
            ),
            VerificationPurpose::Forget => (
                format!("{} password reset link", self.site_name),
                "Please click the link below to reset your password:",
                "Reset password",
            ),
        };

        let text_body = format!("{action} {url}");
        let html_body = self.build_html(&subject, action, button, &url);

        OutgoingEmail {
            to: recipient_email.to_string(),
            subject,
            text_body,
            html_body,
        }
    }

    fn build_html(&self, subject: &str, action: &str, button: &str, url: &str) -> String {
        let url = crate::utils::html::escape(url);
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{subject}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2c3e50;">{site}</h2>
        <p>{action}</p>
        <div style="text-align: center; margin: 30px 0;">
            <a href="{url}" style="background-color: #3498db; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; display: inline-block;">{button}</a>
        </div>
        <p>Or copy and paste this link into your browser:</p>
        <p style="word-break: break-all; color: #7f8c8d;">{url}</p>
    </div>
</body>
</html>"#,
            subject = crate::utils::html::escape(subject),
            site = crate::utils::html::escape(self.site_name),
        )
    }
}

/// Mailer that keeps every message in memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Default::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> ServiceResult<()> {
        if self.fail {
            return Err(ServiceError::external_service("relay unavailable"));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[tokio::test]
    async fn test_register_email_links_activation_route() {
        let config = test_config();
        let mailer = RecordingMailer::default();
        let service = EmailService::new(&mailer, &config);

        service
            .send_verification_email("a@example.com", "Code123", VerificationPurpose::Register)
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
        assert_eq!(sent[0].subject, "MuXue Online account activation link");
        assert!(
            sent[0]
                .text_body
                .contains("http://127.0.0.1:8000/active/Code123")
        );
        assert!(sent[0].html_body.contains("http://127.0.0.1:8000/active/Code123"));
    }

    #[test]
    fn test_forget_url_uses_reset_route() {
        let mut config = test_config();
        config.site_url = "https://muxue.example".to_string();
        let mailer = RecordingMailer::default();
        let service = EmailService::new(&mailer, &config);

        assert_eq!(
            service.verification_url("xyz", VerificationPurpose::Forget),
            "https://muxue.example/reset/xyz"
        );
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let email = OutgoingEmail {
            to: "a@example.com".to_string(),
            subject: "s".to_string(),
            text_body: "t".to_string(),
            html_body: "h".to_string(),
        };
        assert!(LogMailer.send(&email).await.is_ok());
    }

    #[test]
    fn test_mailer_from_config_builds_smtp_relay() {
        let mut config = test_config();
        config.email = Some(EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "user".to_string(),
            smtp_password: "pass".to_string(),
            from_email: "noreply@example.com".to_string(),
            from_name: "MuXue Online".to_string(),
        });
        // Building the transport does not connect.
        let _mailer = mailer_from_config(&config);
    }
}
