/// Error handling for the API server
///
/// All handlers return `ApiResult<T>`; [`ApiError`] maps onto the HTTP
/// status and a JSON body of the form:
///
/// ```json
/// { "error": "Launch not found", "details": "...", "fields": [{ "field": "email", "message": "..." }] }
/// ```
///
/// `details` carries the upstream provider message on 500s caused by the
/// LLM, Stripe or Resend. Other internal errors are logged and replaced by a
/// generic message.
///
/// Quota denials are not errors: handlers return the `QuotaCheck` itself
/// with a 200.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clearlaunch_shared::auth::jwt::JwtError;
use clearlaunch_shared::auth::middleware::AuthError;
use clearlaunch_shared::auth::password::PasswordError;
use clearlaunch_shared::lifecycle::LifecycleError;
use clearlaunch_shared::planning::generated::PlanParseError;
use clearlaunch_shared::quota::QuotaError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clients::email::MailError;
use crate::clients::llm::LlmError;
use crate::clients::stripe::BillingError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found, or owned by someone else (404)
    NotFound(String),

    /// An outbound provider failed (500, message forwarded as `details`)
    Upstream { message: String, details: String },

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Upstream { message, details } => write!(f, "{}: {}", message, details),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                ErrorResponse {
                    error: msg,
                    details: None,
                    fields: None,
                }
            }
            ApiError::ValidationError(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: None,
                fields: Some(errors),
            },
            ApiError::Upstream { message, details } => {
                tracing::error!(details = %details, "{}", message);
                ErrorResponse {
                    error: message,
                    details: Some(details),
                    fields: None,
                }
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ErrorResponse {
                    error: "An internal error occurred".to_string(),
                    details: None,
                    fields: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.constraint().is_some_and(|c| c.contains("email")) {
                    return ApiError::validation("email", "Email is already registered");
                }
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Authentication required".to_string()),
            AuthError::InvalidFormat => ApiError::Unauthorized("Expected Bearer token".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            other => ApiError::Unauthorized(format!("Invalid token: {}", other)),
        }
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::UserNotFound(_) => ApiError::Unauthorized("Account not found".to_string()),
            QuotaError::Database(e) => e.into(),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::LaunchNotFound(_) => ApiError::NotFound("Launch not found".to_string()),
            LifecycleError::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            LifecycleError::Database(e) => e.into(),
        }
    }
}

impl From<PlanParseError> for ApiError {
    fn from(err: PlanParseError) -> Self {
        ApiError::Upstream {
            message: "AI response could not be used".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        ApiError::Upstream {
            message: "AI generation failed".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidPlan(plan) => {
                ApiError::validation("plan", format!("Plan {} cannot be purchased", plan))
            }
            BillingError::Webhook(msg) => ApiError::BadRequest(format!("Invalid webhook: {}", msg)),
            other => ApiError::Upstream {
                message: "Billing request failed".to_string(),
                details: other.to_string(),
            },
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::Upstream {
            message: "Email delivery failed".to_string(),
            details: err.to_string(),
        }
    }
}
