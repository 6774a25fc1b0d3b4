/// Early-access waitlist
///
/// # Endpoint
///
/// ```text
/// POST /v1/early-access
/// { "email": "ada@example.com", "source": "landing" }
/// ```
///
/// Repeated signups for the same email succeed with `"created": false`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use clearlaunch_shared::models::early_access::EarlyAccessSignup;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct EarlyAccessRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 100, message = "Source must be at most 100 characters"))]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarlyAccessResponse {
    pub success: bool,

    /// Whether this was a new signup
    pub created: bool,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<EarlyAccessRequest>,
) -> ApiResult<Json<EarlyAccessResponse>> {
    req.validate()?;

    let created = EarlyAccessSignup::register(&state.db, &req.email, req.source.as_deref()).await?;
    if created {
        tracing::info!(source = ?req.source, "Early access signup");
    }

    Ok(Json(EarlyAccessResponse {
        success: true,
        created,
    }))
}
