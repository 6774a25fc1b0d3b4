//! # ClearLaunch Shared Library
//!
//! Domain types, persistence and business logic used by the ClearLaunch API.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: database models and their queries
//! - `auth`: password hashing, JWT tokens and the auth middleware
//! - `quota`: plan limits and the usage guard
//! - `lifecycle`: launch and task actions with ownership checks
//! - `planning`: templates, prompt builders, LLM output parsing, health scoring
//! - `calendar`: ICS export of scheduled tasks

pub mod auth;
pub mod calendar;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod planning;
pub mod quota;

/// Current version of the ClearLaunch shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
