/// Usage log model
///
/// Append-only audit of metered actions (plan generation, copy generation,
/// task regeneration). Writes are best-effort; see [`crate::quota::UsageGuard::log_usage`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE usage_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     action VARCHAR(100) NOT NULL,
///     launch_id UUID REFERENCES launches(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Usage log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageLog {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Action name, e.g. `generate_plan`
    pub action: String,

    pub launch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UsageLog {
    /// Appends a usage entry
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        action: &str,
        launch_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UsageLog>(
            r#"
            INSERT INTO usage_logs (user_id, action, launch_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, action, launch_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(launch_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's most recent entries
    pub async fn list_recent(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UsageLog>(
            r#"
            SELECT id, user_id, action, launch_id, created_at
            FROM usage_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
