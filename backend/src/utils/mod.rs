//! Collection of general utility functions.
//!
//! Small, reusable helpers that do not fit into a specific domain module.

pub mod generate_random_string;
pub mod html;
