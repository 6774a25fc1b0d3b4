/// Launch model and database operations
///
/// A launch is the top-level planning unit: one product, service or course
/// release owned by a single user. Launch rows carry snapshot counters
/// (`total_tasks`, `completed_tasks`, `progress`) that are derived from the
/// launch's tasks and resynced by [`Launch::recompute_counters`].
///
/// # Status
///
/// ```text
/// active ⇄ archived
/// active → deleted      (paid plans only)
/// archived → deleted    (paid plans only)
/// ```
///
/// Rows in `deleted` status are invisible to every lookup in this module.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE launches (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     launch_type VARCHAR(20) NOT NULL DEFAULT 'product',
///     status VARCHAR(20) NOT NULL DEFAULT 'active',
///     progress DOUBLE PRECISION NOT NULL DEFAULT 0,
///     target_date DATE,
///     launch_start DATE,
///     launch_end DATE,
///     template_id VARCHAR(100),
///     total_tasks INTEGER NOT NULL DEFAULT 0,
///     completed_tasks INTEGER NOT NULL DEFAULT 0,
///     plan_summary TEXT,
///     plan_generated_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE launch_platforms (
///     launch_id UUID NOT NULL REFERENCES launches(id) ON DELETE CASCADE,
///     platform VARCHAR(50) NOT NULL,
///     PRIMARY KEY (launch_id, platform)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const LAUNCH_COLUMNS: &str = "id, user_id, name, description, launch_type, status, progress, \
     target_date, launch_start, launch_end, template_id, total_tasks, completed_tasks, \
     plan_summary, plan_generated_at, created_at, updated_at";

/// Launch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchStatus {
    /// Visible on the dashboard and counted against the plan
    Active,

    /// Hidden from the dashboard, still counted against the plan
    Archived,

    /// Removed by a paid-plan delete; frees the slot
    Deleted,
}

impl LaunchStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchStatus::Active => "active",
            LaunchStatus::Archived => "archived",
            LaunchStatus::Deleted => "deleted",
        }
    }

    /// Parses status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LaunchStatus::Active),
            "archived" => Some(LaunchStatus::Archived),
            "deleted" => Some(LaunchStatus::Deleted),
            _ => None,
        }
    }
}

/// Kind of release being planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LaunchType {
    #[default]
    Product,
    Service,
    Course,
    Other,
}

impl LaunchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchType::Product => "product",
            LaunchType::Service => "service",
            LaunchType::Course => "course",
            LaunchType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(LaunchType::Product),
            "service" => Some(LaunchType::Service),
            "course" => Some(LaunchType::Course),
            "other" => Some(LaunchType::Other),
            _ => None,
        }
    }
}

/// Launch row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Launch {
    /// Unique launch ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Launch name
    pub name: String,

    /// Free-text description
    pub description: Option<String>,

    /// `product`, `service`, `course` or `other`
    pub launch_type: String,

    /// `active`, `archived` or `deleted`
    pub status: String,

    /// Completion percentage, 0 to 100
    pub progress: f64,

    /// The day the launch goes live
    pub target_date: Option<NaiveDate>,

    /// First day of the launch window
    pub launch_start: Option<NaiveDate>,

    /// Last day of the launch window
    pub launch_end: Option<NaiveDate>,

    /// Catalogue template the plan was generated from
    pub template_id: Option<String>,

    /// Snapshot task count
    pub total_tasks: i32,

    /// Snapshot completed-task count
    pub completed_tasks: i32,

    /// AI-generated plan overview
    pub plan_summary: Option<String>,

    /// When the current plan was generated
    pub plan_generated_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Launch {
    /// Gets the parsed status
    pub fn status(&self) -> Option<LaunchStatus> {
        LaunchStatus::parse(&self.status)
    }

    /// Gets the parsed launch type, defaulting unknown values to product
    pub fn kind(&self) -> LaunchType {
        LaunchType::parse(&self.launch_type).unwrap_or_default()
    }

    /// Length of the launch window in whole days
    ///
    /// Uses `launch_start..launch_end`, falling back to creation date through
    /// `target_date`. Returns `None` when neither pair is available.
    pub fn runway_days(&self) -> Option<i64> {
        match (self.launch_start, self.launch_end) {
            (Some(start), Some(end)) => Some((end - start).num_days().max(0)),
            _ => self
                .target_date
                .map(|target| (target - self.created_at.date_naive()).num_days().max(0)),
        }
    }

    /// First day tasks are scheduled from
    pub fn schedule_start(&self) -> NaiveDate {
        self.launch_start
            .unwrap_or_else(|| self.created_at.date_naive())
    }
}

/// Input for creating a launch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLaunch {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub launch_type: LaunchType,
    pub target_date: Option<NaiveDate>,
    pub launch_start: Option<NaiveDate>,
    pub launch_end: Option<NaiveDate>,
    pub template_id: Option<String>,

    /// Platforms selected for this launch
    pub platforms: Vec<String>,
}

/// Optional launch field that an update can reset to null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearableLaunchField {
    Description,
    TargetDate,
    LaunchStart,
    LaunchEnd,
}

impl ClearableLaunchField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "description" => Some(ClearableLaunchField::Description),
            "target_date" => Some(ClearableLaunchField::TargetDate),
            "launch_start" => Some(ClearableLaunchField::LaunchStart),
            "launch_end" => Some(ClearableLaunchField::LaunchEnd),
            _ => None,
        }
    }
}

/// Input for updating a launch
///
/// `None` fields are left unchanged; fields listed in `clear` are set to null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLaunch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub launch_type: Option<LaunchType>,
    pub target_date: Option<NaiveDate>,
    pub launch_start: Option<NaiveDate>,
    pub launch_end: Option<NaiveDate>,
    pub template_id: Option<String>,

    /// Replaces the platform selection when present
    pub platforms: Option<Vec<String>>,

    #[serde(default)]
    pub clear: Vec<ClearableLaunchField>,
}

impl UpdateLaunch {
    pub fn clears(&self, field: ClearableLaunchField) -> bool {
        self.clear.contains(&field)
    }
}

impl Launch {
    /// Creates a launch and its platform selection
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateLaunch) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO launches
                (user_id, name, description, launch_type, target_date, launch_start, launch_end, template_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            LAUNCH_COLUMNS
        );

        let launch = sqlx::query_as::<_, Launch>(&query)
            .bind(data.user_id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.launch_type.as_str())
            .bind(data.target_date)
            .bind(data.launch_start)
            .bind(data.launch_end)
            .bind(data.template_id)
            .fetch_one(pool)
            .await?;

        Self::set_platforms(pool, launch.id, &data.platforms).await?;

        Ok(launch)
    }

    /// Finds a launch by ID with ownership check
    ///
    /// Deleted launches are never returned.
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM launches WHERE id = $1 AND user_id = $2 AND status <> 'deleted'",
            LAUNCH_COLUMNS
        );

        sqlx::query_as::<_, Launch>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's launches, newest first
    ///
    /// With `status = None` both active and archived launches are returned.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<LaunchStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM launches
            WHERE user_id = $1
              AND status <> 'deleted'
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            LAUNCH_COLUMNS
        );

        sqlx::query_as::<_, Launch>(&query)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    /// Counts launches that occupy a plan slot (active or archived)
    pub async fn count_slots_used(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM launches WHERE user_id = $1 AND status IN ('active', 'archived')",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Updates editable launch fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateLaunch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE launches
            SET name = COALESCE($3, name),
                description = CASE WHEN $10 THEN NULL ELSE COALESCE($4, description) END,
                launch_type = COALESCE($5, launch_type),
                target_date = CASE WHEN $11 THEN NULL ELSE COALESCE($6, target_date) END,
                launch_start = CASE WHEN $12 THEN NULL ELSE COALESCE($7, launch_start) END,
                launch_end = CASE WHEN $13 THEN NULL ELSE COALESCE($8, launch_end) END,
                template_id = COALESCE($9, template_id),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status <> 'deleted'
            RETURNING {}
            "#,
            LAUNCH_COLUMNS
        );

        let clear_description = data.clears(ClearableLaunchField::Description);
        let clear_target_date = data.clears(ClearableLaunchField::TargetDate);
        let clear_launch_start = data.clears(ClearableLaunchField::LaunchStart);
        let clear_launch_end = data.clears(ClearableLaunchField::LaunchEnd);

        let launch = sqlx::query_as::<_, Launch>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.launch_type.map(|t| t.as_str()))
            .bind(data.target_date)
            .bind(data.launch_start)
            .bind(data.launch_end)
            .bind(data.template_id)
            .bind(clear_description)
            .bind(clear_target_date)
            .bind(clear_launch_start)
            .bind(clear_launch_end)
            .fetch_optional(pool)
            .await?;

        if let (Some(launch), Some(platforms)) = (&launch, data.platforms) {
            Self::set_platforms(pool, launch.id, &platforms).await?;
        }

        Ok(launch)
    }

    /// Sets the status of an owned, non-deleted launch
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: LaunchStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE launches
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status <> 'deleted'
            RETURNING {}
            "#,
            LAUNCH_COLUMNS
        );

        sqlx::query_as::<_, Launch>(&query)
            .bind(id)
            .bind(user_id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Blanks AI-generated fields and zeroes the snapshot counters
    pub async fn clear_plan(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE launches
            SET plan_summary = NULL,
                plan_generated_at = NULL,
                total_tasks = 0,
                completed_tasks = 0,
                progress = 0,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status <> 'deleted'
            RETURNING {}
            "#,
            LAUNCH_COLUMNS
        );

        sqlx::query_as::<_, Launch>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Records a freshly generated plan's summary and template
    pub async fn mark_plan_generated(
        pool: &PgPool,
        id: Uuid,
        summary: Option<&str>,
        template_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE launches
            SET plan_summary = $2,
                template_id = COALESCE($3, template_id),
                plan_generated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(summary)
        .bind(template_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Recomputes `total_tasks`, `completed_tasks` and `progress` from the tasks table
    ///
    /// Aggregation and write happen in one statement, so the counters always
    /// reflect a single consistent read of the task rows.
    pub async fn recompute_counters(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            WITH counts AS (
                SELECT COUNT(*)::int AS total,
                       COUNT(*) FILTER (WHERE status = 'completed')::int AS completed
                FROM tasks
                WHERE launch_id = $1
            )
            UPDATE launches
            SET total_tasks = counts.total,
                completed_tasks = counts.completed,
                progress = CASE
                    WHEN counts.total = 0 THEN 0
                    ELSE ROUND(counts.completed::numeric * 100 / counts.total)::float8
                END,
                updated_at = NOW()
            FROM counts
            WHERE launches.id = $1
            RETURNING {}
            "#,
            LAUNCH_COLUMNS
        );

        sqlx::query_as::<_, Launch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Gets the platforms selected for a launch
    pub async fn platforms(pool: &PgPool, launch_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT platform FROM launch_platforms WHERE launch_id = $1 ORDER BY platform",
        )
        .bind(launch_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces the platform selection for a launch
    pub async fn set_platforms(
        pool: &PgPool,
        launch_id: Uuid,
        platforms: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM launch_platforms WHERE launch_id = $1")
            .bind(launch_id)
            .execute(pool)
            .await?;

        for platform in platforms {
            let platform = platform.trim();
            if platform.is_empty() {
                continue;
            }

            sqlx::query(
                "INSERT INTO launch_platforms (launch_id, platform) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(launch_id)
            .bind(platform)
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}
