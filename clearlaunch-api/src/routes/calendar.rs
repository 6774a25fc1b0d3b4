/// Calendar export endpoints
///
/// - `GET /v1/launches/:id/calendar.ics` - one launch
/// - `GET /v1/calendar.ics` - every scheduled task across active launches
///
/// Both answer `text/calendar` as a file download. Tasks without a due date
/// are left out.

use crate::{app::AppState, error::ApiResult, routes::launches::owned_launch};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    calendar::{build_calendar, calendar_filename},
    models::task::Task,
};
use uuid::Uuid;

pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Name of the combined calendar
pub const ALL_LAUNCHES_CALENDAR: &str = "ClearLaunch";

fn ics_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn launch_calendar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let launch = owned_launch(&state, auth.user_id, id).await?;
    let tasks = Task::list_by_launch(&state.db, launch.id).await?;

    let body = build_calendar(&launch.name, &tasks);
    Ok(ics_response(&calendar_filename(&launch.name), body))
}

pub async fn user_calendar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let tasks = Task::list_scheduled_for_user(&state.db, auth.user_id).await?;

    let body = build_calendar(ALL_LAUNCHES_CALENDAR, &tasks);
    Ok(ics_response(&calendar_filename(ALL_LAUNCHES_CALENDAR), body))
}
