//! Middleware resolving the session cookie into the current user.

use crate::auth::models::CurrentUser;
use crate::auth::service::AuthService;
use crate::auth::session::{SESSION_COOKIE_NAME, extract_cookie};
use crate::views::common::AppState;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

/// Optional session authentication (doesn't fail if there is no session).
///
/// Always inserts a [`CurrentUser`] extension for the handlers. A store
/// failure while resolving the session is logged and the request proceeds
/// anonymously.
pub async fn session_auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let state = request
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut current = CurrentUser::default();
    if let Some(token) = extract_cookie(request.headers(), SESSION_COOKIE_NAME) {
        let auth_service = AuthService::new(&state.pool, &state.config);
        match auth_service.session_user(&token).await {
            Ok(Some(user)) => {
                current.user = Some(user);
                current.session_token = Some(token);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to resolve session: {}", e),
        }
    }

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}
