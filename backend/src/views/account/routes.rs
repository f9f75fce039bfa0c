//! Defines the HTTP routes for the account lifecycle pages.

use crate::views::account::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// Creates the router for registration, activation and password reset
pub fn account_router() -> Router {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/active/{code}", get(activate))
        .route("/forget", get(forget_page).post(forget))
        .route("/reset/{code}", get(reset_page))
        .route("/reset", post(reset_password))
}
