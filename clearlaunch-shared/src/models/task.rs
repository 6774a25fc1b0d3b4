/// Task model and database operations
///
/// A task is one actionable item inside a launch, either generated by the
/// planner or created manually. Tasks are sequenced by `sort_order` (exposed as
/// `order` in JSON) and scheduled by `due_date` with an optional `post_time`.
///
/// # Status
///
/// ```text
/// todo → in_progress → completed
///   ↑__________________________|   (any status may be set directly)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     launch_id UUID NOT NULL REFERENCES launches(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     category VARCHAR(100),
///     phase VARCHAR(100),
///     status VARCHAR(20) NOT NULL DEFAULT 'todo',
///     platform VARCHAR(50),
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     due_date TIMESTAMPTZ,
///     post_time TIME,
///     outline TEXT,
///     review_status VARCHAR(50),
///     ai_generated BOOLEAN NOT NULL DEFAULT FALSE,
///     beat_code VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use clearlaunch_shared::models::task::{Task, NewTask};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, launch_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create_next(&pool, launch_id, user_id, NewTask {
///     title: "Record teaser reel".to_string(),
///     platform: Some("Instagram".to_string()),
///     ..Default::default()
/// }).await?;
///
/// println!("task {} is #{}", task.id, task.sort_order);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, launch_id, user_id, title, description, category, phase, status, \
     platform, sort_order, due_date, post_time, outline, review_status, ai_generated, beat_code, \
     created_at, updated_at";

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Done; counts toward launch progress
    Completed,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning launch
    pub launch_id: Uuid,

    /// Owning user (denormalized from the launch for ownership filters)
    pub user_id: Uuid,

    pub title: String,
    pub description: Option<String>,

    /// Free-form category, e.g. `marketing`, `content`, `ops`
    pub category: Option<String>,

    /// Template phase label, e.g. `Research & Setup`, `Teaser`
    pub phase: Option<String>,

    /// `todo`, `in_progress` or `completed`
    pub status: String,

    /// Channel the task publishes to, if any
    pub platform: Option<String>,

    /// Stable sequence within the launch
    #[serde(rename = "order")]
    pub sort_order: i32,

    /// Scheduled day (and default time) of the task
    pub due_date: Option<DateTime<Utc>>,

    /// Time-of-day override for publishing, in UTC
    pub post_time: Option<NaiveTime>,

    /// Generated copy or strategy outline
    pub outline: Option<String>,

    /// Reviewer state for the outline (`pending`, `approved`, ...)
    pub review_status: Option<String>,

    /// Whether the task came from the planner
    pub ai_generated: bool,

    /// Canonical template beat this task belongs to
    pub beat_code: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Gets the parsed status, treating unknown values as todo
    pub fn status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status).unwrap_or(TaskStatus::Todo)
    }

    /// Whether the task counts toward launch progress
    pub fn is_completed(&self) -> bool {
        self.status() == TaskStatus::Completed
    }
}

/// Input for inserting a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub phase: Option<String>,
    pub platform: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub post_time: Option<NaiveTime>,
    pub outline: Option<String>,
    pub ai_generated: bool,
    pub beat_code: Option<String>,

    /// Explicit sequence; ignored by [`Task::create_next`]
    pub sort_order: i32,
}

/// Optional task field that an update can reset to null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearableTaskField {
    Description,
    Platform,
    DueDate,
    PostTime,
}

impl ClearableTaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearableTaskField::Description => "description",
            ClearableTaskField::Platform => "platform",
            ClearableTaskField::DueDate => "due_date",
            ClearableTaskField::PostTime => "post_time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "description" => Some(ClearableTaskField::Description),
            "platform" => Some(ClearableTaskField::Platform),
            "due_date" => Some(ClearableTaskField::DueDate),
            "post_time" => Some(ClearableTaskField::PostTime),
            _ => None,
        }
    }
}

/// Input for updating a task
///
/// `None` fields are left unchanged; fields listed in `clear` are set to null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub phase: Option<String>,
    pub status: Option<TaskStatus>,
    pub platform: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub post_time: Option<NaiveTime>,
    pub outline: Option<String>,
    pub review_status: Option<String>,

    #[serde(default)]
    pub clear: Vec<ClearableTaskField>,
}

impl UpdateTask {
    /// Whether applying this update can change launch progress
    pub fn touches_status(&self) -> bool {
        self.status.is_some()
    }

    pub fn clears(&self, field: ClearableTaskField) -> bool {
        self.clear.contains(&field)
    }
}

impl Task {
    /// Inserts a task with an explicit `sort_order`
    pub async fn insert(
        pool: &PgPool,
        launch_id: Uuid,
        user_id: Uuid,
        data: NewTask,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks
                (launch_id, user_id, title, description, category, phase, platform, sort_order,
                 due_date, post_time, outline, ai_generated, beat_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(launch_id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.phase)
            .bind(data.platform)
            .bind(data.sort_order)
            .bind(data.due_date)
            .bind(data.post_time)
            .bind(data.outline)
            .bind(data.ai_generated)
            .bind(data.beat_code)
            .fetch_one(pool)
            .await
    }

    /// Inserts a task at the end of the launch's sequence (`max(order) + 1`)
    ///
    /// The next order is read in the same statement as the insert, but two
    /// concurrent creates for one launch can still pick the same value.
    pub async fn create_next(
        pool: &PgPool,
        launch_id: Uuid,
        user_id: Uuid,
        data: NewTask,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks
                (launch_id, user_id, title, description, category, phase, platform, sort_order,
                 due_date, post_time, outline, ai_generated, beat_code)
            SELECT $1, $2, $3, $4, $5, $6, $7, COALESCE(MAX(sort_order), 0) + 1,
                   $8, $9, $10, $11, $12
            FROM tasks
            WHERE launch_id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(launch_id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.phase)
            .bind(data.platform)
            .bind(data.due_date)
            .bind(data.post_time)
            .bind(data.outline)
            .bind(data.ai_generated)
            .bind(data.beat_code)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID with ownership check
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a launch's tasks in sequence order
    pub async fn list_by_launch(pool: &PgPool, launch_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE launch_id = $1 ORDER BY sort_order ASC, created_at ASC",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(launch_id)
            .fetch_all(pool)
            .await
    }

    /// Lists every scheduled task across a user's active launches
    pub async fn list_scheduled_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE user_id = $1
              AND due_date IS NOT NULL
              AND launch_id IN (
                  SELECT id FROM launches WHERE user_id = $1 AND status = 'active'
              )
            ORDER BY due_date ASC, sort_order ASC
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Updates editable task fields with ownership check
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = CASE WHEN $13 THEN NULL ELSE COALESCE($4, description) END,
                category = COALESCE($5, category),
                phase = COALESCE($6, phase),
                status = COALESCE($7, status),
                platform = CASE WHEN $14 THEN NULL ELSE COALESCE($8, platform) END,
                due_date = CASE WHEN $15 THEN NULL ELSE COALESCE($9, due_date) END,
                post_time = CASE WHEN $16 THEN NULL ELSE COALESCE($10, post_time) END,
                outline = COALESCE($11, outline),
                review_status = COALESCE($12, review_status),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let clear_description = data.clears(ClearableTaskField::Description);
        let clear_platform = data.clears(ClearableTaskField::Platform);
        let clear_due_date = data.clears(ClearableTaskField::DueDate);
        let clear_post_time = data.clears(ClearableTaskField::PostTime);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.phase)
            .bind(data.status.map(|s| s.as_str()))
            .bind(data.platform)
            .bind(data.due_date)
            .bind(data.post_time)
            .bind(data.outline)
            .bind(data.review_status)
            .bind(clear_description)
            .bind(clear_platform)
            .bind(clear_due_date)
            .bind(clear_post_time)
            .fetch_optional(pool)
            .await
    }

    /// Overwrites a task's content with a regenerated version
    ///
    /// Keeps id, order, status and post time; takes the regenerated due date
    /// when there is one. Marks the task as AI-generated and clears any stale
    /// outline.
    pub async fn replace_content(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: NewTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                category = COALESCE($5, category),
                phase = COALESCE($6, phase),
                platform = COALESCE($7, platform),
                beat_code = COALESCE($8, beat_code),
                due_date = COALESCE($9, due_date),
                outline = NULL,
                review_status = NULL,
                ai_generated = TRUE,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.phase)
            .bind(data.platform)
            .bind(data.beat_code)
            .bind(data.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Stores generated copy on a task and marks it for review
    pub async fn set_outline(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        outline: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET outline = $3, review_status = 'pending', updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(outline)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task with ownership check
    pub async fn delete_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a launch, returning how many were removed
    pub async fn delete_by_launch(pool: &PgPool, launch_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE launch_id = $1")
            .bind(launch_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn test_task_status_serde_matches_storage() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_touches_status() {
        assert!(!UpdateTask::default().touches_status());
        assert!(UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        }
        .touches_status());
    }

    #[test]
    fn test_sort_order_serialized_as_order() {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            launch_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Teaser post".to_string(),
            description: None,
            category: None,
            phase: None,
            status: "completed".to_string(),
            platform: None,
            sort_order: 7,
            due_date: None,
            post_time: None,
            outline: None,
            review_status: None,
            ai_generated: false,
            beat_code: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["order"], 7);
        assert!(value.get("sort_order").is_none());
        assert!(task.is_completed());
    }
}
