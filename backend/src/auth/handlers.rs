//! Handler functions for the login and logout pages.
//!
//! These functions parse the submitted forms, validate input, and interact
//! with `auth::service` for the authentication logic.

use crate::auth::models::{CurrentUser, LoginForm, LoginOutcome};
use crate::auth::service::AuthService;
use crate::auth::session::SessionCookie;
use crate::views::common::{
    AppState, PageResult, service_error_to_page, validation_errors_to_field_errors,
};
use crate::views::templates::{self, MSG_BAD_CREDENTIALS, MSG_LOGGED_OUT, MSG_NOT_ACTIVE};
use axum::{
    extract::{Extension, Form},
    http::header,
    response::{Html, IntoResponse, Response},
};
use validator::Validate;

/// Render the empty login form
#[axum::debug_handler]
pub async fn login_page() -> Html<String> {
    templates::login_page(None, &[], "")
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    if let Err(errors) = form.validate() {
        let errors = validation_errors_to_field_errors(errors);
        return Ok(templates::login_page(None, &errors, &form.username).into_response());
    }

    let auth_service = AuthService::new(&state.pool, &state.config);
    let outcome = auth_service
        .login(&form)
        .await
        .map_err(service_error_to_page)?;

    let response = match outcome {
        LoginOutcome::LoggedIn { user, session } => {
            let cookie = SessionCookie::from_config(&state.config).build_set_cookie(&session.token);
            (
                [(header::SET_COOKIE, cookie)],
                templates::index_page(Some(&user)),
            )
                .into_response()
        }
        LoginOutcome::Inactive => {
            templates::login_page(Some(MSG_NOT_ACTIVE), &[], &form.username).into_response()
        }
        LoginOutcome::InvalidCredentials => {
            templates::login_page(Some(MSG_BAD_CREDENTIALS), &[], &form.username).into_response()
        }
    };

    Ok(response)
}

/// Handle logout request: drop the session and clear the cookie
#[axum::debug_handler]
pub async fn logout(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> PageResult<Response> {
    if let Some(token) = current.session_token.as_deref() {
        let auth_service = AuthService::new(&state.pool, &state.config);
        auth_service
            .logout(token)
            .await
            .map_err(service_error_to_page)?;
    }

    let cookie = SessionCookie::from_config(&state.config).build_delete_cookie();
    Ok((
        [(header::SET_COOKIE, cookie)],
        templates::login_page(Some(MSG_LOGGED_OUT), &[], ""),
    )
        .into_response())
}
