/// Launch and task lifecycle actions
///
/// Every action scopes its lookups to `(id, user_id)` so a caller can never
/// touch another user's rows; a miss is reported as not found either way.
///
/// Writes are sequential and non-transactional. Secondary bookkeeping
/// (counter resync after a task edit, task removal during a delete) is logged
/// on failure and never fails the primary action.
///
/// # Example
///
/// ```no_run
/// use clearlaunch_shared::lifecycle::{archive_launch, delete_launch};
/// use clearlaunch_shared::models::user::Plan;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, launch_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// archive_launch(&pool, user_id, launch_id).await?;
/// let outcome = delete_launch(&pool, user_id, launch_id, Plan::Free).await?;
/// assert!(!outcome.slot_freed());
/// # Ok(())
/// # }
/// ```

use crate::models::launch::{Launch, LaunchStatus};
use crate::models::task::{NewTask, Task, UpdateTask};
use crate::models::user::Plan;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Lifecycle action error
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Launch missing, deleted or owned by someone else
    #[error("Launch not found: {0}")]
    LaunchNotFound(Uuid),

    /// Task missing or owned by someone else
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What deleting a launch does for a given plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// Archive and wipe tasks; the launch keeps occupying its slot
    SoftArchive,
    /// Mark deleted and wipe tasks; the slot is released
    HardDelete,
}

impl DeletionPolicy {
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => DeletionPolicy::SoftArchive,
            Plan::Pro | Plan::Power => DeletionPolicy::HardDelete,
        }
    }

    /// Status the launch ends up in
    pub fn resulting_status(&self) -> LaunchStatus {
        match self {
            DeletionPolicy::SoftArchive => LaunchStatus::Archived,
            DeletionPolicy::HardDelete => LaunchStatus::Deleted,
        }
    }
}

/// Result of [`delete_launch`]
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub launch_id: Uuid,
    pub policy: DeletionPolicy,
    pub status: LaunchStatus,
    pub tasks_removed: u64,
}

impl DeleteOutcome {
    /// Whether the launch stopped counting against the plan's launch limit
    pub fn slot_freed(&self) -> bool {
        self.policy == DeletionPolicy::HardDelete
    }
}

/// Launch progress counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaunchProgress {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// `round(completed / total * 100)`, 0 when there are no tasks
    pub progress: f64,
}

impl LaunchProgress {
    pub fn from_counts(total_tasks: i64, completed_tasks: i64) -> Self {
        let progress = if total_tasks <= 0 {
            0.0
        } else {
            ((completed_tasks as f64 / total_tasks as f64) * 100.0).round()
        };

        LaunchProgress {
            total_tasks,
            completed_tasks,
            progress,
        }
    }

    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.is_completed()).count();
        Self::from_counts(tasks.len() as i64, completed as i64)
    }
}

async fn owned_launch(pool: &PgPool, user_id: Uuid, launch_id: Uuid) -> Result<Launch, LifecycleError> {
    Launch::find_by_id_and_user(pool, launch_id, user_id)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))
}

/// Resyncs a launch's counters, logging instead of failing
async fn resync_counters(pool: &PgPool, launch_id: Uuid) -> Option<Launch> {
    match Launch::recompute_counters(pool, launch_id).await {
        Ok(launch) => launch,
        Err(e) => {
            tracing::warn!(launch_id = %launch_id, error = %e, "Failed to resync launch progress");
            None
        }
    }
}

/// Archives a launch; archiving an archived launch succeeds unchanged
pub async fn archive_launch(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
) -> Result<Launch, LifecycleError> {
    let launch = Launch::set_status(pool, launch_id, user_id, LaunchStatus::Archived)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))?;

    tracing::info!(user_id = %user_id, launch_id = %launch_id, "Launch archived");
    Ok(launch)
}

/// Restores an archived launch to active
pub async fn unarchive_launch(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
) -> Result<Launch, LifecycleError> {
    let launch = Launch::set_status(pool, launch_id, user_id, LaunchStatus::Active)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))?;

    tracing::info!(user_id = %user_id, launch_id = %launch_id, "Launch unarchived");
    Ok(launch)
}

/// Deletes a launch according to the plan's [`DeletionPolicy`]
///
/// The status change is the primary write. Task removal and the counter
/// resync that follows are best-effort.
pub async fn delete_launch(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
    plan: Plan,
) -> Result<DeleteOutcome, LifecycleError> {
    let policy = DeletionPolicy::for_plan(plan);
    let status = policy.resulting_status();

    Launch::set_status(pool, launch_id, user_id, status)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))?;

    let tasks_removed = match Task::delete_by_launch(pool, launch_id).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(launch_id = %launch_id, error = %e, "Failed to remove tasks of deleted launch");
            0
        }
    };
    resync_counters(pool, launch_id).await;

    tracing::info!(
        user_id = %user_id,
        launch_id = %launch_id,
        policy = ?policy,
        tasks_removed,
        "Launch deleted"
    );

    Ok(DeleteOutcome {
        launch_id,
        policy,
        status,
        tasks_removed,
    })
}

/// Wipes a launch's tasks and AI output while keeping the launch row
pub async fn reset_launch(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
) -> Result<Launch, LifecycleError> {
    owned_launch(pool, user_id, launch_id).await?;

    let removed = Task::delete_by_launch(pool, launch_id).await?;
    let launch = Launch::clear_plan(pool, launch_id, user_id)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))?;

    tracing::info!(user_id = %user_id, launch_id = %launch_id, removed, "Launch reset");
    Ok(launch)
}

/// Appends a task to a launch
pub async fn create_task(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
    data: NewTask,
) -> Result<Task, LifecycleError> {
    owned_launch(pool, user_id, launch_id).await?;

    let task = Task::create_next(pool, launch_id, user_id, data).await?;
    resync_counters(pool, launch_id).await;

    tracing::info!(user_id = %user_id, launch_id = %launch_id, task_id = %task.id, "Task created");
    Ok(task)
}

/// Updates a task, resyncing launch progress when its status changed
pub async fn update_task(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
    data: UpdateTask,
) -> Result<Task, LifecycleError> {
    let touches_status = data.touches_status();

    let task = Task::update(pool, task_id, user_id, data)
        .await?
        .ok_or(LifecycleError::TaskNotFound(task_id))?;

    if touches_status {
        resync_counters(pool, task.launch_id).await;
    }

    tracing::debug!(user_id = %user_id, task_id = %task_id, status = %task.status, "Task updated");
    Ok(task)
}

/// Deletes a task and resyncs its launch
pub async fn delete_task(pool: &PgPool, user_id: Uuid, task_id: Uuid) -> Result<(), LifecycleError> {
    let task = Task::find_by_id_and_user(pool, task_id, user_id)
        .await?
        .ok_or(LifecycleError::TaskNotFound(task_id))?;

    if !Task::delete_by_id_and_user(pool, task_id, user_id).await? {
        return Err(LifecycleError::TaskNotFound(task_id));
    }
    resync_counters(pool, task.launch_id).await;

    tracing::info!(user_id = %user_id, task_id = %task_id, "Task deleted");
    Ok(())
}

/// Replaces a launch's tasks with a freshly generated plan
///
/// Tasks are inserted with the `sort_order` they carry. Returns the launch
/// with resynced counters and the inserted tasks in order.
pub async fn replace_plan(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
    tasks: Vec<NewTask>,
    summary: Option<&str>,
    template_id: Option<&str>,
) -> Result<(Launch, Vec<Task>), LifecycleError> {
    let launch = owned_launch(pool, user_id, launch_id).await?;

    Task::delete_by_launch(pool, launch_id).await?;

    let mut inserted = Vec::with_capacity(tasks.len());
    for task in tasks {
        inserted.push(Task::insert(pool, launch_id, user_id, task).await?);
    }

    Launch::mark_plan_generated(pool, launch_id, summary, template_id).await?;
    let launch = resync_counters(pool, launch_id).await.unwrap_or(launch);

    tracing::info!(
        user_id = %user_id,
        launch_id = %launch_id,
        tasks = inserted.len(),
        "Launch plan replaced"
    );

    Ok((launch, inserted))
}

/// Overwrites one task with regenerated content
pub async fn replace_task_content(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
    data: NewTask,
) -> Result<Task, LifecycleError> {
    let task = Task::replace_content(pool, task_id, user_id, data)
        .await?
        .ok_or(LifecycleError::TaskNotFound(task_id))?;

    tracing::info!(user_id = %user_id, task_id = %task_id, "Task regenerated");
    Ok(task)
}

/// Recomputes a launch's counters from its tasks
pub async fn recompute_launch_progress(
    pool: &PgPool,
    user_id: Uuid,
    launch_id: Uuid,
) -> Result<Launch, LifecycleError> {
    owned_launch(pool, user_id, launch_id).await?;

    Launch::recompute_counters(pool, launch_id)
        .await?
        .ok_or(LifecycleError::LaunchNotFound(launch_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deletion_policy_by_plan() {
        assert_eq!(DeletionPolicy::for_plan(Plan::Free), DeletionPolicy::SoftArchive);
        assert_eq!(DeletionPolicy::for_plan(Plan::Pro), DeletionPolicy::HardDelete);
        assert_eq!(DeletionPolicy::for_plan(Plan::Power), DeletionPolicy::HardDelete);
    }

    #[test]
    fn test_deletion_policy_status() {
        assert_eq!(DeletionPolicy::SoftArchive.resulting_status(), LaunchStatus::Archived);
        assert_eq!(DeletionPolicy::HardDelete.resulting_status(), LaunchStatus::Deleted);
    }

    #[test]
    fn test_slot_freed_only_on_hard_delete() {
        let outcome = |policy: DeletionPolicy| DeleteOutcome {
            launch_id: Uuid::new_v4(),
            policy,
            status: policy.resulting_status(),
            tasks_removed: 3,
        };

        assert!(!outcome(DeletionPolicy::SoftArchive).slot_freed());
        assert!(outcome(DeletionPolicy::HardDelete).slot_freed());
    }

    #[test]
    fn test_progress_from_counts() {
        assert_eq!(LaunchProgress::from_counts(0, 0).progress, 0.0);
        assert_eq!(LaunchProgress::from_counts(4, 1).progress, 25.0);
        assert_eq!(LaunchProgress::from_counts(3, 2).progress, 67.0);
        assert_eq!(LaunchProgress::from_counts(3, 3).progress, 100.0);
        assert_eq!(LaunchProgress::from_counts(8, 1).progress, 13.0);
    }

    #[test]
    fn test_progress_serialization() {
        let json = serde_json::to_value(LaunchProgress::from_counts(2, 1)).unwrap();
        assert_eq!(json["total_tasks"], 2);
        assert_eq!(json["completed_tasks"], 1);
        assert_eq!(json["progress"], 50.0);
    }
}
