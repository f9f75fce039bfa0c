//! Data access layer.
//!
//! Each repository wraps the SQLite pool and owns the SQL for one table.
//! Operations that must join a transaction take a `&mut SqliteConnection`
//! instead of going through the pool.

pub mod session_repository;
pub mod user_repository;
pub mod verification_repository;
