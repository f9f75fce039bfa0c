//! Shared plumbing for page handlers.
//!
//! Provides the application state passed to every handler, conversion of
//! service-layer errors into error pages, and formatting of form validation
//! errors for re-rendered forms.
//!
//! # Error Handling Flow
//! 1. Service layer returns domain-specific `ServiceError`
//! 2. Handlers render the expected outcomes (bad form input, duplicate email,
//!    unusable code) as regular pages with HTTP 200
//! 3. Anything else goes through `service_error_to_page`

use crate::config::Config;
use crate::errors::ServiceError;
use crate::services::email_service::Mailer;
use crate::views::templates;
use axum::{http::StatusCode, response::Html};
use sqlx::SqlitePool;
use std::sync::Arc;

/// State shared by all handlers, installed as a request extension.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

/// Result of a page handler: the rendered page or an error page with its status.
pub type PageResult<T = Html<String>> = Result<T, (StatusCode, Html<String>)>;

/// Field-specific validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Converts ServiceError to an HTTP status and error page
pub fn service_error_to_page(error: ServiceError) -> (StatusCode, Html<String>) {
    let (status, message) = match error {
        ServiceError::Validation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound { entity, .. } => {
            (StatusCode::NOT_FOUND, format!("{} not found", entity))
        }
        ServiceError::AlreadyExists { entity, .. } => {
            (StatusCode::CONFLICT, format!("{} already exists", entity))
        }
        ServiceError::PermissionDenied { message } => (StatusCode::FORBIDDEN, message),
        ServiceError::InvalidOperation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {:#}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        ServiceError::ExternalService { message } => {
            tracing::error!("External service error: {}", message);
            (
                StatusCode::BAD_GATEWAY,
                "A required service is unavailable".to_string(),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (status, templates::error_page(status, &message))
}

/// Formats validator::ValidationErrors into field-specific error details,
/// ordered by field name.
pub fn validation_errors_to_field_errors(errors: validator::ValidationErrors) -> Vec<FieldError> {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })
        })
        .collect();
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));
    field_errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Must be a valid email"))]
        email: String,
        #[validate(length(min = 5))]
        password: String,
    }

    #[test]
    fn test_validation_errors_to_field_errors() {
        let probe = Probe {
            email: "nope".to_string(),
            password: "1".to_string(),
        };
        let errors = validation_errors_to_field_errors(probe.validate().unwrap_err());
        assert_eq!(
            errors,
            vec![
                FieldError {
                    field: "email".to_string(),
                    message: "Must be a valid email".to_string(),
                },
                FieldError {
                    field: "password".to_string(),
                    message: "Invalid value".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_service_error_to_page_hides_internals() {
        let (status, Html(body)) = service_error_to_page(ServiceError::Database {
            source: anyhow::anyhow!("disk I/O error at /var/lib/db"),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("/var/lib/db"));

        let (status, _) = service_error_to_page(ServiceError::permission_denied("nope"));
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
