/// Task endpoints
///
/// - `PATCH  /v1/tasks/:id` - update fields; a status change resyncs launch progress.
///   `"clear": ["due_date", ...]` resets `description`, `platform`, `due_date`
///   or `post_time` to null.
/// - `DELETE /v1/tasks/:id` - delete and resync launch progress

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{launches::BLANK_TITLE, required_text},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveTime, Utc};
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    lifecycle,
    models::task::{ClearableTaskField, Task, TaskStatus, UpdateTask},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

/// Update task request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be between 1 and 500 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub category: Option<String>,
    pub phase: Option<String>,

    /// `todo`, `in_progress` or `completed`
    pub status: Option<String>,

    pub platform: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub post_time: Option<NaiveTime>,
    pub outline: Option<String>,

    #[validate(length(max = 50, message = "Review status must be at most 50 characters"))]
    pub review_status: Option<String>,

    /// Optional fields to reset to null
    #[serde(default)]
    pub clear: Vec<String>,
}

impl UpdateTaskRequest {
    fn into_update(self) -> ApiResult<UpdateTask> {
        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => Some(TaskStatus::parse(raw).ok_or_else(|| {
                ApiError::validation("status", "Status must be todo, in_progress or completed")
            })?),
        };

        let mut clear = Vec::with_capacity(self.clear.len());
        for raw in &self.clear {
            let field = ClearableTaskField::parse(raw).ok_or_else(|| {
                ApiError::validation(
                    "clear",
                    "Only description, platform, due_date and post_time can be cleared",
                )
            })?;
            let also_set = match field {
                ClearableTaskField::Description => self.description.is_some(),
                ClearableTaskField::Platform => self.platform.is_some(),
                ClearableTaskField::DueDate => self.due_date.is_some(),
                ClearableTaskField::PostTime => self.post_time.is_some(),
            };
            if also_set {
                return Err(ApiError::validation(
                    "clear",
                    format!("{} cannot be set and cleared together", field.as_str()),
                ));
            }
            clear.push(field);
        }

        let title = self
            .title
            .as_deref()
            .map(|t| required_text("title", t, BLANK_TITLE))
            .transpose()?;

        Ok(UpdateTask {
            title,
            description: self.description,
            category: self.category,
            phase: self.phase,
            status,
            platform: self.platform,
            due_date: self.due_date,
            post_time: self.post_time,
            outline: self.outline,
            review_status: self.review_status,
            clear,
        })
    }
}

/// Update a task
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/tasks/:id
/// { "status": "completed" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Task not found
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let update = req.into_update()?;

    let task = lifecycle::update_task(&state.db, auth.user_id, id, update).await?;
    Ok(Json(task))
}

/// Delete a task
///
/// Responds `{"success": true}`.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    lifecycle::delete_task(&state.db, auth.user_id, id).await?;
    Ok(Json(json!({ "success": true })))
}
