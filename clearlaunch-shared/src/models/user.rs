/// User model and database operations
///
/// A user carries their subscription plan and the monthly AI-call counter
/// alongside the account fields. Plan and counters are mutated by billing sync
/// and the usage guard; rows are never hard-deleted by the application.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255),
///     plan VARCHAR(20) NOT NULL DEFAULT 'free',
///     ai_calls_used INTEGER NOT NULL DEFAULT 0,
///     ai_calls_reset_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     onboarded BOOLEAN NOT NULL DEFAULT FALSE,
///     stripe_customer_id VARCHAR(255),
///     stripe_subscription_id VARCHAR(255),
///     subscription_status VARCHAR(50),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use clearlaunch_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "founder@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("Ada".to_string()),
/// }).await?;
///
/// println!("{} is on the {} plan", user.email, user.plan_tier().as_str());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, plan, ai_calls_used, ai_calls_reset_date, \
     onboarded, stripe_customer_id, stripe_subscription_id, subscription_status, created_at, updated_at";

/// Subscription tier
///
/// Tiers determine the launch-count and monthly AI-call quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier (1 launch, 5 AI calls/month)
    Free,

    /// Pro tier (3 launches, 100 AI calls/month)
    Pro,

    /// Power tier (10 launches, 300 AI calls/month)
    Power,
}

impl Plan {
    /// Converts plan to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Power => "power",
        }
    }

    /// Parses plan from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "pro" => Some(Plan::Pro),
            "power" => Some(Plan::Power),
            _ => None,
        }
    }

    /// Whether this is a paid tier
    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (unique)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional display name
    pub name: Option<String>,

    /// Subscription plan (`free`, `pro`, `power`)
    pub plan: String,

    /// AI calls used in the current calendar month
    pub ai_calls_used: i32,

    /// When the AI-call counter was last reset
    pub ai_calls_reset_date: DateTime<Utc>,

    /// Whether the business profile onboarding has been completed
    pub onboarded: bool,

    /// Stripe customer ID (set after first checkout)
    pub stripe_customer_id: Option<String>,

    /// Stripe subscription ID
    pub stripe_subscription_id: Option<String>,

    /// Last subscription status reported by Stripe
    pub subscription_status: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Gets the parsed plan, defaulting unknown values to free
    pub fn plan_tier(&self) -> Plan {
        Plan::parse(&self.plan).unwrap_or(Plan::Free)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (never the plaintext password)
    pub password_hash: String,

    /// Optional display name
    pub name: Option<String>,
}

/// Subscription fields written by billing sync
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    /// New plan, if it changed
    pub plan: Option<Plan>,

    /// Stripe customer ID
    pub stripe_customer_id: Option<String>,

    /// Stripe subscription ID
    pub stripe_subscription_id: Option<String>,

    /// Subscription status (`active`, `past_due`, `canceled`, ...)
    pub subscription_status: Option<String>,
}

impl User {
    /// Creates a new user on the free plan
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email.trim().to_lowercase())
            .bind(data.password_hash)
            .bind(data.name)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by Stripe customer ID
    pub async fn find_by_stripe_customer(
        pool: &PgPool,
        customer_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE stripe_customer_id = $1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks the user as having completed onboarding
    pub async fn mark_onboarded(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET onboarded = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes subscription fields from a billing event
    ///
    /// Only `Some` fields are changed.
    pub async fn update_subscription(
        pool: &PgPool,
        id: Uuid,
        data: SubscriptionUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET plan = COALESCE($2, plan),
                stripe_customer_id = COALESCE($3, stripe_customer_id),
                stripe_subscription_id = COALESCE($4, stripe_subscription_id),
                subscription_status = COALESCE($5, subscription_status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.plan.map(|p| p.as_str()))
            .bind(data.stripe_customer_id)
            .bind(data.stripe_subscription_id)
            .bind(data.subscription_status)
            .fetch_optional(pool)
            .await
    }

    /// Sets the AI-call counter to zero and stamps the reset date
    pub async fn reset_ai_calls(
        pool: &PgPool,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET ai_calls_used = 0, ai_calls_reset_date = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increments the AI-call counter unless it has already reached `cap`
    ///
    /// Single conditional statement; returns `false` when the cap was hit
    /// (or the user does not exist) and nothing was written.
    pub async fn increment_ai_calls_capped(
        pool: &PgPool,
        id: Uuid,
        cap: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET ai_calls_used = ai_calls_used + 1, updated_at = NOW()
            WHERE id = $1 AND ai_calls_used < $2
            "#,
        )
        .bind(id)
        .bind(cap)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
