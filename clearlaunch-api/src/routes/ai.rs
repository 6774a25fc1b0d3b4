/// AI generation endpoints
///
/// - `POST /v1/launches/:id/plan` - generate a full plan, replacing existing tasks
/// - `POST /v1/tasks/:id/regenerate` - rewrite one task
/// - `POST /v1/tasks/:id/copy` - write copy or a strategy outline for one task
///
/// Each call is gated on the monthly AI-call limit. A denied check answers
/// `200 OK` with the quota body and never reaches the provider. The counter
/// is incremented only after the result has been stored.

use crate::{
    app::AppState,
    clients::llm::ResponseFormat,
    error::{ApiError, ApiResult},
    routes::launches::{launch_template, owned_launch},
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    lifecycle,
    models::{business_profile::BusinessProfile, launch::Launch, task::Task},
    planning::{
        generated::{
            normalize_copy_output, parse_generated_plan, parse_generated_task,
            schedule_generated_tasks, to_new_task,
        },
        launch_plan_prompt::{build_launch_plan_prompt, build_regenerate_task_prompt},
        task_copy_prompt::{build_task_copy_prompt, CopyMode},
        LaunchContext,
    },
};
use serde::Serialize;
use uuid::Uuid;

/// Runway assumed when a launch has neither a window nor a target date
pub const DEFAULT_RUNWAY_DAYS: i64 = 14;

/// Generated plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub launch: Launch,
    pub tasks: Vec<Task>,
}

/// Generated copy response
#[derive(Debug, Serialize)]
pub struct CopyResponse {
    pub mode: CopyMode,
    pub task: Task,
}

async fn launch_context(state: &AppState, user_id: Uuid, launch: &Launch) -> ApiResult<LaunchContext> {
    let profile = BusinessProfile::find_by_user(&state.db, user_id).await?;
    let platforms = Launch::platforms(&state.db, launch.id).await?;

    Ok(LaunchContext::from_parts(profile.as_ref(), launch, platforms))
}

async fn owned_task_with_launch(state: &AppState, user_id: Uuid, task_id: Uuid) -> ApiResult<(Task, Launch)> {
    let task = Task::find_by_id_and_user(&state.db, task_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    let launch = owned_launch(state, user_id, task.launch_id).await?;

    Ok((task, launch))
}

/// Counts a successful generation against the monthly limit
async fn record_ai_call(state: &AppState, user_id: Uuid, action: &str, launch_id: Uuid) {
    if !state.guard.increment_ai_usage(user_id).await {
        tracing::warn!(user_id = %user_id, action, "AI call not counted");
    }
    state.guard.log_usage(user_id, action, Some(launch_id)).await;
}

/// Generate a launch plan
///
/// Replaces every task of the launch with a freshly generated schedule
/// starting at the launch start (or creation date).
///
/// # Response
///
/// ```json
/// { "launch": { "id": "uuid", "total_tasks": 12, ... }, "tasks": [ ... ] }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Launch not found
/// - `500 Internal Server Error`: Provider failed or returned an unusable plan
pub async fn generate_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let launch = owned_launch(&state, auth.user_id, id).await?;

    let check = state.guard.check_ai_call_limit(auth.user_id).await;
    if !check.allowed {
        return Ok(Json(check).into_response());
    }

    let ctx = launch_context(&state, auth.user_id, &launch).await?;
    let template = launch_template(&launch);
    let runway_days = launch.runway_days().unwrap_or(DEFAULT_RUNWAY_DAYS);

    let prompt = build_launch_plan_prompt(&ctx, runway_days, template);
    let raw = state.llm.complete(&prompt, ResponseFormat::Json).await?;
    let plan = parse_generated_plan(&raw)?;

    let tasks = schedule_generated_tasks(plan.tasks, launch.schedule_start(), template);
    let (launch, tasks) = lifecycle::replace_plan(
        &state.db,
        auth.user_id,
        id,
        tasks,
        plan.summary.as_deref(),
        template.map(|t| t.id),
    )
    .await?;

    record_ai_call(&state, auth.user_id, "generate_plan", id).await;

    Ok(Json(PlanResponse { launch, tasks }).into_response())
}

/// Regenerate a single task
///
/// The task keeps its id and position; content, schedule and beat are replaced.
pub async fn regenerate_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (task, launch) = owned_task_with_launch(&state, auth.user_id, id).await?;

    let check = state.guard.check_ai_call_limit(auth.user_id).await;
    if !check.allowed {
        return Ok(Json(check).into_response());
    }

    let ctx = launch_context(&state, auth.user_id, &launch).await?;
    let runway_days = launch.runway_days().unwrap_or(DEFAULT_RUNWAY_DAYS);

    let prompt = build_regenerate_task_prompt(&ctx, &task, runway_days);
    let raw = state.llm.complete(&prompt, ResponseFormat::Json).await?;
    let generated = parse_generated_task(&raw)?;

    let replacement = to_new_task(generated, launch.schedule_start(), launch_template(&launch));
    let task = lifecycle::replace_task_content(&state.db, auth.user_id, id, replacement).await?;

    record_ai_call(&state, auth.user_id, "regenerate_task", launch.id).await;

    Ok(Json(task).into_response())
}

/// Generate copy for a task
///
/// Content tasks get a JSON object of per-platform copy; everything else
/// gets a strategy outline. The result is stored as the task outline.
pub async fn generate_copy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (task, launch) = owned_task_with_launch(&state, auth.user_id, id).await?;

    let check = state.guard.check_ai_call_limit(auth.user_id).await;
    if !check.allowed {
        return Ok(Json(check).into_response());
    }

    let ctx = launch_context(&state, auth.user_id, &launch).await?;
    let prompt = build_task_copy_prompt(&ctx, &task);

    let format = match prompt.mode {
        CopyMode::Content => ResponseFormat::Json,
        CopyMode::Strategy => ResponseFormat::Text,
    };
    let raw = state.llm.complete(&prompt.text, format).await?;
    let outline = normalize_copy_output(prompt.mode, &raw)?;

    let task = Task::set_outline(&state.db, id, auth.user_id, &outline)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    record_ai_call(&state, auth.user_id, "generate_copy", launch.id).await;

    Ok(Json(CopyResponse {
        mode: prompt.mode,
        task,
    })
    .into_response())
}
