/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `early_access`: Waitlist signup
/// - `profile`: Business profile
/// - `usage`: Plan limits and current usage
/// - `launches`: Launch CRUD and lifecycle actions
/// - `tasks`: Task update and delete
/// - `ai`: Plan, task and copy generation
/// - `calendar`: ICS export
/// - `billing`: Stripe checkout, portal and webhook

pub mod ai;
pub mod auth;
pub mod billing;
pub mod calendar;
pub mod early_access;
pub mod health;
pub mod launches;
pub mod profile;
pub mod tasks;
pub mod usage;

use crate::error::{ApiError, ApiResult};

/// Trims a required text field, rejecting values that are only whitespace
pub(crate) fn required_text(field: &str, value: &str, message: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(field, message));
    }
    Ok(trimmed.to_string())
}
