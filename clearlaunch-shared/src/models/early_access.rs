/// Early-access waitlist signups
///
/// # Schema
///
/// ```sql
/// CREATE TABLE early_access_signups (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     source VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EarlyAccessSignup {
    pub id: Uuid,
    pub email: String,

    /// Where the signup came from (landing page, referral tag, ...)
    pub source: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl EarlyAccessSignup {
    /// Records a signup; repeated emails are ignored
    ///
    /// Returns `true` when a new row was written.
    pub async fn register(
        pool: &PgPool,
        email: &str,
        source: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO early_access_signups (email, source)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(email.trim().to_lowercase())
        .bind(source)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
