/// Business profile endpoints
///
/// - `GET /v1/profile` - current profile, `null` before onboarding
/// - `PUT /v1/profile` - create or replace; marks the user onboarded

use crate::{app::AppState, error::ApiResult, routes::required_text};
use axum::{extract::State, Extension, Json};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    models::business_profile::{BusinessProfile, UpsertBusinessProfile},
    models::user::User,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,

    pub brand_description: Option<String>,

    #[validate(length(max = 255, message = "Industry must be at most 255 characters"))]
    pub industry: Option<String>,

    pub target_audience: Option<String>,

    #[validate(length(max = 255, message = "Tone of voice must be at most 255 characters"))]
    pub tone_of_voice: Option<String>,

    #[serde(default)]
    pub platforms: Vec<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Option<BusinessProfile>>> {
    let profile = BusinessProfile::find_by_user(&state.db, auth.user_id).await?;
    Ok(Json(profile))
}

/// Saves the business profile
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<BusinessProfile>> {
    req.validate()?;
    let company_name = required_text("company_name", &req.company_name, "Company name is required")?;

    let mut platforms: Vec<String> = Vec::with_capacity(req.platforms.len());
    for platform in req.platforms {
        let platform = platform.trim().to_string();
        if !platform.is_empty() && !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }

    let profile = BusinessProfile::upsert(
        &state.db,
        auth.user_id,
        UpsertBusinessProfile {
            company_name,
            brand_description: req.brand_description,
            industry: req.industry,
            target_audience: req.target_audience,
            tone_of_voice: req.tone_of_voice,
            platforms,
            website: req.website,
        },
    )
    .await?;

    User::mark_onboarded(&state.db, auth.user_id).await?;
    tracing::info!(user_id = %auth.user_id, "Business profile saved");

    Ok(Json(profile))
}
