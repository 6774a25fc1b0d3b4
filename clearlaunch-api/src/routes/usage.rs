/// Usage endpoint
///
/// # Endpoint
///
/// ```text
/// GET /v1/usage
/// ```
///
/// # Response
///
/// ```json
/// {
///   "plan": "free",
///   "limits": { "maxLaunches": 1, "maxAiCalls": 5 },
///   "launchesUsed": 1,
///   "aiCallsUsed": 3,
///   "aiCallsResetDate": "2024-06-01T00:00:00Z",
///   "launchCheck": { "allowed": false, "message": "...", "upgradeUrl": "...", "current": 1, "limit": 1 },
///   "aiCallCheck": { "allowed": true, "current": 3, "limit": 5 }
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    quota::{QuotaCheck, UsageSummary},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    #[serde(flatten)]
    pub summary: UsageSummary,
    pub launch_check: QuotaCheck,
    pub ai_call_check: QuotaCheck,
}

pub async fn get_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UsageResponse>> {
    // Run the AI check first so a stale monthly counter is reset before the summary reads it
    let ai_call_check = state.guard.check_ai_call_limit(auth.user_id).await;
    let launch_check = state.guard.check_launch_limit(auth.user_id).await;
    let summary = state.guard.usage_summary(auth.user_id).await?;

    Ok(Json(UsageResponse {
        summary,
        launch_check,
        ai_call_check,
    }))
}
