/// Launch endpoints
///
/// # Endpoints
///
/// - `GET    /v1/launches?status=active|archived` - list launches
/// - `POST   /v1/launches` - create a launch (launch-limit gated)
/// - `GET    /v1/launches/:id` - launch with platforms, tasks and health
/// - `PATCH  /v1/launches/:id` - update launch fields; `"clear": [...]` resets
///   `description`, `target_date`, `launch_start` or `launch_end` to null
/// - `DELETE /v1/launches/:id` - plan-gated delete
/// - `POST   /v1/launches/:id/archive` / `unarchive` / `reset`
/// - `POST   /v1/launches/:id/resync` - recompute progress counters from the tasks
/// - `POST   /v1/launches/:id/tasks` - append a manual task
///
/// Launches owned by another user answer 404, same as missing ones.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::required_text,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    lifecycle::{self, DeleteOutcome},
    models::{
        launch::{
            ClearableLaunchField, CreateLaunch, Launch, LaunchStatus, LaunchType, UpdateLaunch,
        },
        task::{NewTask, Task},
        user::User,
    },
    planning::{
        health::{calculate_launch_health, LaunchHealth},
        templates::{default_template_for, find_template, LaunchTemplate},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing launches
#[derive(Debug, Deserialize)]
pub struct ListLaunchesQuery {
    pub status: Option<String>,
}

/// Create launch request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLaunchRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub launch_type: LaunchType,

    pub target_date: Option<NaiveDate>,
    pub launch_start: Option<NaiveDate>,
    pub launch_end: Option<NaiveDate>,
    pub template_id: Option<String>,

    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Update launch request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLaunchRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub launch_type: Option<LaunchType>,
    pub target_date: Option<NaiveDate>,
    pub launch_start: Option<NaiveDate>,
    pub launch_end: Option<NaiveDate>,
    pub template_id: Option<String>,
    pub platforms: Option<Vec<String>>,

    /// Optional fields to reset to null
    #[serde(default)]
    pub clear: Vec<String>,
}

impl UpdateLaunchRequest {
    fn clear_fields(&self) -> ApiResult<Vec<ClearableLaunchField>> {
        let mut fields = Vec::with_capacity(self.clear.len());
        for raw in &self.clear {
            let field = ClearableLaunchField::parse(raw).ok_or_else(|| {
                ApiError::validation(
                    "clear",
                    "Only description, target_date, launch_start and launch_end can be cleared",
                )
            })?;
            let also_set = match field {
                ClearableLaunchField::Description => self.description.is_some(),
                ClearableLaunchField::TargetDate => self.target_date.is_some(),
                ClearableLaunchField::LaunchStart => self.launch_start.is_some(),
                ClearableLaunchField::LaunchEnd => self.launch_end.is_some(),
            };
            if also_set {
                return Err(ApiError::validation(
                    "clear",
                    format!("{} cannot be set and cleared together", raw),
                ));
            }
            fields.push(field);
        }
        Ok(fields)
    }
}

/// Manual task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be between 1 and 500 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub category: Option<String>,
    pub phase: Option<String>,
    pub platform: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub post_time: Option<NaiveTime>,
}

const BLANK_NAME: &str = "Name must not be blank";
pub(crate) const BLANK_TITLE: &str = "Title must not be blank";

/// Launch with everything the launch page renders
#[derive(Debug, Serialize)]
pub struct LaunchDetail {
    #[serde(flatten)]
    pub launch: Launch,
    pub platforms: Vec<String>,
    pub tasks: Vec<Task>,
    pub health: LaunchHealth,
}

/// Template a launch is planned against
///
/// The stored `template_id` wins; otherwise the default for the launch type.
pub(crate) fn launch_template(launch: &Launch) -> Option<&'static LaunchTemplate> {
    launch
        .template_id
        .as_deref()
        .and_then(find_template)
        .or_else(|| default_template_for(launch.kind()))
}

pub(crate) async fn owned_launch(state: &AppState, user_id: Uuid, launch_id: Uuid) -> ApiResult<Launch> {
    Launch::find_by_id_and_user(&state.db, launch_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Launch not found".to_string()))
}

fn check_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::validation(
                "launch_end",
                "Launch end must not be before launch start",
            ));
        }
    }
    Ok(())
}

fn check_template(template_id: Option<&str>) -> ApiResult<()> {
    match template_id {
        Some(id) if find_template(id).is_none() => {
            Err(ApiError::validation("template_id", format!("Unknown template {}", id)))
        }
        _ => Ok(()),
    }
}

async fn launch_detail(state: &AppState, launch: Launch) -> ApiResult<LaunchDetail> {
    let platforms = Launch::platforms(&state.db, launch.id).await?;
    let tasks = Task::list_by_launch(&state.db, launch.id).await?;
    let health = calculate_launch_health(&launch, &tasks, launch_template(&launch));

    Ok(LaunchDetail {
        launch,
        platforms,
        tasks,
        health,
    })
}

/// List launches
///
/// Without `status`, active and archived launches are returned, newest first.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status filter
pub async fn list_launches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListLaunchesQuery>,
) -> ApiResult<Json<Vec<Launch>>> {
    let status = match query.status.as_deref() {
        None => None,
        Some(s) => match LaunchStatus::parse(s) {
            Some(LaunchStatus::Deleted) | None => {
                return Err(ApiError::BadRequest(format!("Invalid status filter: {}", s)))
            }
            status => status,
        },
    };

    let launches = Launch::list_by_user(&state.db, auth.user_id, status).await?;
    Ok(Json(launches))
}

/// Create a launch
///
/// # Endpoint
///
/// ```text
/// POST /v1/launches
/// {
///   "name": "Summer Serum",
///   "launch_type": "product",
///   "launch_start": "2024-06-01",
///   "launch_end": "2024-06-15",
///   "platforms": ["Instagram", "Email"]
/// }
/// ```
///
/// # Response
///
/// The created [`LaunchDetail`]; when the plan's launch limit is reached,
/// `200 OK` with the denied quota check instead:
///
/// ```json
/// { "allowed": false, "message": "...", "upgradeUrl": "...", "current": 1, "limit": 1 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateLaunchRequest>,
) -> ApiResult<Response> {
    req.validate()?;
    let name = required_text("name", &req.name, BLANK_NAME)?;
    check_window(req.launch_start, req.launch_end)?;
    check_template(req.template_id.as_deref())?;

    let check = state.guard.check_launch_limit(auth.user_id).await;
    if !check.allowed {
        return Ok(Json(check).into_response());
    }

    let launch = Launch::create(
        &state.db,
        CreateLaunch {
            user_id: auth.user_id,
            name,
            description: req.description,
            launch_type: req.launch_type,
            target_date: req.target_date,
            launch_start: req.launch_start,
            launch_end: req.launch_end,
            template_id: req.template_id,
            platforms: req.platforms,
        },
    )
    .await?;

    state
        .guard
        .log_usage(auth.user_id, "launch_created", Some(launch.id))
        .await;
    tracing::info!(user_id = %auth.user_id, launch_id = %launch.id, "Launch created");

    let detail = launch_detail(&state, launch).await?;
    Ok(Json(detail).into_response())
}

/// Get a launch with its platforms, tasks and health
pub async fn get_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LaunchDetail>> {
    let launch = owned_launch(&state, auth.user_id, id).await?;
    Ok(Json(launch_detail(&state, launch).await?))
}

/// Update launch fields
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Launch not found
pub async fn update_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLaunchRequest>,
) -> ApiResult<Json<LaunchDetail>> {
    req.validate()?;
    let name = req
        .name
        .as_deref()
        .map(|n| required_text("name", n, BLANK_NAME))
        .transpose()?;
    check_template(req.template_id.as_deref())?;
    let clear = req.clear_fields()?;

    let current = owned_launch(&state, auth.user_id, id).await?;
    let merged = |value: Option<NaiveDate>, stored: Option<NaiveDate>, field: ClearableLaunchField| {
        if clear.contains(&field) {
            None
        } else {
            value.or(stored)
        }
    };
    check_window(
        merged(req.launch_start, current.launch_start, ClearableLaunchField::LaunchStart),
        merged(req.launch_end, current.launch_end, ClearableLaunchField::LaunchEnd),
    )?;

    let launch = Launch::update(
        &state.db,
        id,
        auth.user_id,
        UpdateLaunch {
            name,
            description: req.description,
            launch_type: req.launch_type,
            target_date: req.target_date,
            launch_start: req.launch_start,
            launch_end: req.launch_end,
            template_id: req.template_id,
            platforms: req.platforms,
            clear,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Launch not found".to_string()))?;

    Ok(Json(launch_detail(&state, launch).await?))
}

/// Archive a launch
pub async fn archive_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Launch>> {
    let launch = lifecycle::archive_launch(&state.db, auth.user_id, id).await?;
    Ok(Json(launch))
}

/// Restore an archived launch
pub async fn unarchive_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Launch>> {
    let launch = lifecycle::unarchive_launch(&state.db, auth.user_id, id).await?;
    Ok(Json(launch))
}

/// Remove all tasks and AI output from a launch
pub async fn reset_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Launch>> {
    let launch = lifecycle::reset_launch(&state.db, auth.user_id, id).await?;
    state
        .guard
        .log_usage(auth.user_id, "launch_reset", Some(id))
        .await;
    Ok(Json(launch))
}

/// Recompute a launch's task counters and progress from its tasks
pub async fn resync_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LaunchDetail>> {
    let launch = lifecycle::recompute_launch_progress(&state.db, auth.user_id, id).await?;
    Ok(Json(launch_detail(&state, launch).await?))
}

/// Delete a launch
///
/// Free plans archive the launch and wipe its tasks (the slot stays used);
/// paid plans delete it and free the slot.
///
/// # Response
///
/// ```json
/// { "launch_id": "uuid", "policy": "hard_delete", "status": "deleted", "tasks_removed": 12 }
/// ```
pub async fn delete_launch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteOutcome>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account not found".to_string()))?;

    let outcome = lifecycle::delete_launch(&state.db, auth.user_id, id, user.plan_tier()).await?;
    Ok(Json(outcome))
}

/// Append a manual task to a launch
///
/// The task goes to the end of the sequence and launch counters are resynced.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let title = required_text("title", &req.title, BLANK_TITLE)?;

    let task = lifecycle::create_task(
        &state.db,
        auth.user_id,
        id,
        NewTask {
            title,
            description: req.description,
            category: req.category,
            phase: req.phase,
            platform: req.platform,
            due_date: req.due_date,
            post_time: req.post_time,
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_order() {
        let june = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        assert!(check_window(Some(june(1)), Some(june(15))).is_ok());
        assert!(check_window(Some(june(1)), Some(june(1))).is_ok());
        assert!(check_window(None, Some(june(1))).is_ok());
        assert!(matches!(
            check_window(Some(june(15)), Some(june(1))),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_clear_fields() {
        let req: UpdateLaunchRequest =
            serde_json::from_value(serde_json::json!({ "clear": ["launch_end", "description"] })).unwrap();
        assert_eq!(
            req.clear_fields().unwrap(),
            vec![ClearableLaunchField::LaunchEnd, ClearableLaunchField::Description]
        );

        let req: UpdateLaunchRequest =
            serde_json::from_value(serde_json::json!({ "clear": ["name"] })).unwrap();
        assert!(matches!(req.clear_fields(), Err(ApiError::ValidationError(_))));

        let req: UpdateLaunchRequest = serde_json::from_value(
            serde_json::json!({ "launch_end": "2024-06-15", "clear": ["launch_end"] }),
        )
        .unwrap();
        assert!(matches!(req.clear_fields(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_template_rejected() {
        assert!(check_template(None).is_ok());
        assert!(check_template(Some("no-such-template")).is_err());
    }
}
