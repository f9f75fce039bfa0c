//! Handler functions for the account lifecycle pages.
//!
//! Expected failures (bad input, duplicate email, unusable verification
//! code) render a page with HTTP 200; everything else becomes an error page.

use crate::database::models::VerificationPurpose;
use crate::errors::ServiceError;
use crate::services::user_service::UserService;
use crate::services::verification_service::VerificationService;
use crate::views::account::models::{ForgetForm, ModifyPasswordForm, RegisterForm};
use crate::views::common::{
    AppState, PageResult, service_error_to_page, validation_errors_to_field_errors,
};
use crate::views::templates::{
    self, MSG_ACTIVATED, MSG_CHECK_EMAIL, MSG_EMAIL_TAKEN, MSG_PASSWORD_MISMATCH,
    MSG_PASSWORD_UPDATED,
};
use axum::{
    extract::{Extension, Form, Path},
    response::Html,
};
use validator::Validate;

/// Render the empty registration form
#[axum::debug_handler]
pub async fn register_page() -> Html<String> {
    templates::register_page(None, &[], "")
}

/// Handle a registration: create the inactive account and mail its activation link.
///
/// Registering again with an address that was never activated mails a fresh
/// activation link instead of reporting the address as taken.
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<AppState>,
    Form(form): Form<RegisterForm>,
) -> PageResult {
    if let Err(errors) = form.validate() {
        let errors = validation_errors_to_field_errors(errors);
        return Ok(templates::register_page(None, &errors, &form.email));
    }

    let user_service = UserService::new(&state.pool, &state.config);
    let verification_service =
        VerificationService::new(&state.pool, &state.config, state.mailer.as_ref());

    match user_service.register(&form.email, &form.password).await {
        Ok((_, record)) => verification_service.deliver(&record).await,
        Err(ServiceError::AlreadyExists { .. }) => {
            let pending = user_service
                .awaiting_activation(&form.email)
                .await
                .map_err(service_error_to_page)?;
            if !pending {
                return Ok(templates::register_page(
                    Some(MSG_EMAIL_TAKEN),
                    &[],
                    &form.email,
                ));
            }

            tracing::info!("Re-sending activation link to {}", form.email);
            verification_service
                .issue(&form.email, VerificationPurpose::Register)
                .await
                .map_err(service_error_to_page)?;
        }
        Err(error) => return Err(service_error_to_page(error)),
    }

    Ok(templates::login_page(Some(MSG_CHECK_EMAIL), &[], &form.email))
}

/// Handle an activation link
#[axum::debug_handler]
pub async fn activate(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
) -> PageResult {
    let user_service = UserService::new(&state.pool, &state.config);
    match user_service.activate(&code).await {
        Ok(email) => Ok(templates::login_page(Some(MSG_ACTIVATED), &[], &email)),
        Err(ServiceError::NotFound { .. } | ServiceError::InvalidOperation { .. }) => {
            Ok(templates::active_fail_page())
        }
        Err(error) => Err(service_error_to_page(error)),
    }
}

/// Render the empty forgotten-password form
#[axum::debug_handler]
pub async fn forget_page() -> Html<String> {
    templates::forget_page(&[], "")
}

/// Handle a forgotten-password request.
///
/// The confirmation page is the same whether or not an account exists for
/// the address.
#[axum::debug_handler]
pub async fn forget(
    Extension(state): Extension<AppState>,
    Form(form): Form<ForgetForm>,
) -> PageResult {
    if let Err(errors) = form.validate() {
        let errors = validation_errors_to_field_errors(errors);
        return Ok(templates::forget_page(&errors, &form.email));
    }

    let user_service = UserService::new(&state.pool, &state.config);
    let registered = user_service
        .email_registered(&form.email)
        .await
        .map_err(service_error_to_page)?;

    if registered {
        VerificationService::new(&state.pool, &state.config, state.mailer.as_ref())
            .issue(&form.email, VerificationPurpose::Forget)
            .await
            .map_err(service_error_to_page)?;
    } else {
        tracing::warn!("Password reset requested for unknown email {}", form.email);
    }

    Ok(templates::send_success_page())
}

/// Handle a password reset link: show the new-password form
#[axum::debug_handler]
pub async fn reset_page(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
) -> PageResult {
    let record = VerificationService::new(&state.pool, &state.config, state.mailer.as_ref())
        .lookup(&code, VerificationPurpose::Forget)
        .await
        .map_err(service_error_to_page)?;

    match record {
        Some(record) => Ok(templates::password_reset_page(
            &record.email,
            &record.code,
            None,
            &[],
        )),
        None => Ok(templates::active_fail_page()),
    }
}

/// Handle the new-password submission
#[axum::debug_handler]
pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Form(form): Form<ModifyPasswordForm>,
) -> PageResult {
    if let Err(errors) = form.validate() {
        let errors = validation_errors_to_field_errors(errors);
        return Ok(templates::password_reset_page(
            &form.email,
            &form.code,
            None,
            &errors,
        ));
    }

    if !form.passwords_match() {
        return Ok(templates::password_reset_page(
            &form.email,
            &form.code,
            Some(MSG_PASSWORD_MISMATCH),
            &[],
        ));
    }

    let user_service = UserService::new(&state.pool, &state.config);
    match user_service
        .reset_password(&form.code, &form.email, &form.password1)
        .await
    {
        Ok(()) => Ok(templates::login_page(
            Some(MSG_PASSWORD_UPDATED),
            &[],
            &form.email,
        )),
        Err(
            ServiceError::NotFound { .. }
            | ServiceError::InvalidOperation { .. }
            | ServiceError::PermissionDenied { .. },
        ) => Ok(templates::active_fail_page()),
        Err(error) => Err(service_error_to_page(error)),
    }
}
