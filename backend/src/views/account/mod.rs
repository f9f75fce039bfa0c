//! Account lifecycle pages: registration, activation, forgotten password
//! and password reset.

pub mod handlers;
pub mod models;
pub mod routes;
