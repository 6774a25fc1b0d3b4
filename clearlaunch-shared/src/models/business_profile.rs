/// Business profile captured during onboarding
///
/// One row per user. The profile feeds the launch context of every prompt
/// (company, brand, audience, tone, default platforms).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE business_profiles (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     company_name VARCHAR(255) NOT NULL,
///     brand_description TEXT,
///     industry VARCHAR(255),
///     target_audience TEXT,
///     tone_of_voice VARCHAR(255),
///     platforms TEXT[] NOT NULL DEFAULT '{}',
///     website VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Business profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessProfile {
    pub user_id: Uuid,
    pub company_name: String,
    pub brand_description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone_of_voice: Option<String>,

    /// Platforms the business publishes on
    pub platforms: Vec<String>,

    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by onboarding and profile edits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertBusinessProfile {
    pub company_name: String,
    pub brand_description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone_of_voice: Option<String>,
    pub platforms: Vec<String>,
    pub website: Option<String>,
}

impl BusinessProfile {
    /// Finds the profile for a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BusinessProfile>(
            r#"
            SELECT user_id, company_name, brand_description, industry, target_audience,
                   tone_of_voice, platforms, website, created_at, updated_at
            FROM business_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Creates or replaces the profile for a user
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        data: UpsertBusinessProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BusinessProfile>(
            r#"
            INSERT INTO business_profiles
                (user_id, company_name, brand_description, industry, target_audience,
                 tone_of_voice, platforms, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET company_name = EXCLUDED.company_name,
                brand_description = EXCLUDED.brand_description,
                industry = EXCLUDED.industry,
                target_audience = EXCLUDED.target_audience,
                tone_of_voice = EXCLUDED.tone_of_voice,
                platforms = EXCLUDED.platforms,
                website = EXCLUDED.website,
                updated_at = NOW()
            RETURNING user_id, company_name, brand_description, industry, target_audience,
                      tone_of_voice, platforms, website, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.company_name)
        .bind(data.brand_description)
        .bind(data.industry)
        .bind(data.target_audience)
        .bind(data.tone_of_voice)
        .bind(data.platforms)
        .bind(data.website)
        .fetch_one(pool)
        .await
    }
}
