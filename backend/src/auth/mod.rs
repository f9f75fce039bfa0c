//! Authentication module for login, logout and sessions.
//!
//! This module provides the credential authenticator (username or email plus
//! password), server-side sessions carried by a cookie, and the middleware
//! that exposes the logged-in user to handlers.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod session;
