//! Page handlers and rendering.
//!
//! Each submodule maps HTTP verbs on a group of routes to service calls and
//! picks the page to render. Responses are HTML, not a programmatic API.

pub mod account;
pub mod common;
pub mod home;
pub mod templates;
