/// Usage guard for plan-based quotas
///
/// Two quotas are enforced per user, both derived from the subscription plan:
/// - launches occupying a slot (active or archived)
/// - AI calls in the current calendar month
///
/// # Limits by Plan
///
/// | Plan  | Launches | AI calls / month |
/// |-------|----------|------------------|
/// | free  | 1        | 5                |
/// | pro   | 3        | 100              |
/// | power | 10       | 300              |
///
/// The AI-call counter lives on the user row and is reset to zero the first
/// time it is checked in a new (month, year). This is calendar-month
/// granularity, not a rolling window.
///
/// # Failure semantics
///
/// Checks fail closed: any database error produces a denied [`QuotaCheck`].
/// Bookkeeping (counter increment, usage log) fails open: errors are logged
/// and swallowed.
///
/// # Example
///
/// ```no_run
/// use clearlaunch_shared::quota::UsageGuard;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) {
/// let guard = UsageGuard::new(pool, "https://clearlaunch.app/pricing");
///
/// let check = guard.check_ai_call_limit(user_id).await;
/// if !check.allowed {
///     println!("{}", check.message.unwrap_or_default());
///     return;
/// }
///
/// // ... call the LLM ...
///
/// guard.increment_ai_usage(user_id).await;
/// guard.log_usage(user_id, "generate_plan", None).await;
/// # }
/// ```

use crate::models::launch::Launch;
use crate::models::usage_log::UsageLog;
use crate::models::user::{Plan, User};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Usage guard error
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User row missing
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
}

/// Type of quota to check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    /// Launches occupying a plan slot
    Launches,

    /// AI calls this calendar month
    AiCalls,
}

impl QuotaKind {
    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Launches => "launches",
            QuotaKind::AiCalls => "AI generations this month",
        }
    }
}

/// Quota limits for one plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    /// Maximum launches occupying a slot
    pub max_launches: u32,

    /// Maximum AI calls per calendar month
    pub max_ai_calls: u32,
}

impl PlanLimits {
    /// Gets quota limits for a plan
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => PlanLimits {
                max_launches: 1,
                max_ai_calls: 5,
            },
            Plan::Pro => PlanLimits {
                max_launches: 3,
                max_ai_calls: 100,
            },
            Plan::Power => PlanLimits {
                max_launches: 10,
                max_ai_calls: 300,
            },
        }
    }

    /// Gets limit for a specific quota
    pub fn get(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Launches => self.max_launches,
            QuotaKind::AiCalls => self.max_ai_calls,
        }
    }
}

/// Whether a user on `plan` with `current_launches` may create another
pub fn can_create_launch(plan: Plan, current_launches: u32) -> bool {
    current_launches < PlanLimits::for_plan(plan).max_launches
}

/// Whether a user on `plan` with `calls_used` this month may make another AI call
pub fn can_make_ai_call(plan: Plan, calls_used: u32) -> bool {
    calls_used < PlanLimits::for_plan(plan).max_ai_calls
}

/// Whether the monthly counter stamped at `reset_date` is stale at `now`
///
/// Compares (month, year) only.
pub fn needs_monthly_reset(reset_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (reset_date.month(), reset_date.year()) != (now.month(), now.year())
}

/// Result of a quota check
///
/// Serialized as `{allowed, message?, upgradeUrl?, current, limit}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCheck {
    /// Whether the action may proceed
    pub allowed: bool,

    /// User-facing explanation when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Where to send the user to upgrade when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_url: Option<String>,

    /// Current usage
    pub current: u32,

    /// Maximum allowed
    pub limit: u32,
}

impl QuotaCheck {
    /// Creates a result indicating quota is available
    pub fn allowed(current: u32, limit: u32) -> Self {
        QuotaCheck {
            allowed: true,
            message: None,
            upgrade_url: None,
            current,
            limit,
        }
    }

    /// Creates a result indicating quota is exhausted
    pub fn exceeded(kind: QuotaKind, plan: Plan, current: u32, limit: u32, upgrade_url: &str) -> Self {
        let message = match kind {
            QuotaKind::Launches => format!(
                "You've reached the {} plan limit of {} {}. Upgrade to create more.",
                plan.as_str(),
                limit,
                if limit == 1 { "launch" } else { "launches" }
            ),
            QuotaKind::AiCalls => format!(
                "You've used all {} AI generations included in the {} plan this month. Upgrade for more.",
                limit,
                plan.as_str()
            ),
        };

        QuotaCheck {
            allowed: false,
            message: Some(message),
            upgrade_url: Some(upgrade_url.to_string()),
            current,
            limit,
        }
    }

    /// Creates a denied result for when usage could not be read
    pub fn unavailable(upgrade_url: &str) -> Self {
        QuotaCheck {
            allowed: false,
            message: Some("Unable to verify your usage right now. Please try again.".to_string()),
            upgrade_url: Some(upgrade_url.to_string()),
            current: 0,
            limit: 0,
        }
    }
}

/// Snapshot of a user's plan, limits and usage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub launches_used: u32,
    pub ai_calls_used: u32,
    pub ai_calls_reset_date: DateTime<Utc>,
}

/// Usage guard service
///
/// Reads plan and counters from the users table and decides allow/deny.
#[derive(Clone)]
pub struct UsageGuard {
    db: PgPool,
    upgrade_url: String,
}

impl UsageGuard {
    /// Creates a new usage guard
    pub fn new(db: PgPool, upgrade_url: impl Into<String>) -> Self {
        UsageGuard {
            db,
            upgrade_url: upgrade_url.into(),
        }
    }

    /// URL denied checks point the user to
    pub fn upgrade_url(&self) -> &str {
        &self.upgrade_url
    }

    /// Checks whether the user may create another launch
    ///
    /// Never errors; a failed lookup is reported as denied.
    pub async fn check_launch_limit(&self, user_id: Uuid) -> QuotaCheck {
        match self.try_check_launch_limit(user_id).await {
            Ok(check) => check,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Launch limit check failed, denying");
                QuotaCheck::unavailable(&self.upgrade_url)
            }
        }
    }

    /// Launch limit check that surfaces lookup errors
    pub async fn try_check_launch_limit(&self, user_id: Uuid) -> Result<QuotaCheck, QuotaError> {
        let user = self.load_user(user_id).await?;
        let plan = user.plan_tier();
        let limit = PlanLimits::for_plan(plan).max_launches;
        let current = Launch::count_slots_used(&self.db, user_id).await? as u32;

        debug!(user_id = %user_id, plan = plan.as_str(), current, limit, "Checked launch limit");

        if can_create_launch(plan, current) {
            Ok(QuotaCheck::allowed(current, limit))
        } else {
            info!(user_id = %user_id, current, limit, "Launch limit reached");
            Ok(QuotaCheck::exceeded(
                QuotaKind::Launches,
                plan,
                current,
                limit,
                &self.upgrade_url,
            ))
        }
    }

    /// Checks whether the user may make another AI call this month
    ///
    /// Resets a stale monthly counter before comparing. Never errors.
    pub async fn check_ai_call_limit(&self, user_id: Uuid) -> QuotaCheck {
        self.check_ai_call_limit_at(user_id, Utc::now()).await
    }

    /// [`Self::check_ai_call_limit`] with an explicit clock
    pub async fn check_ai_call_limit_at(&self, user_id: Uuid, now: DateTime<Utc>) -> QuotaCheck {
        match self.try_check_ai_call_limit(user_id, now).await {
            Ok(check) => check,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "AI call limit check failed, denying");
                QuotaCheck::unavailable(&self.upgrade_url)
            }
        }
    }

    /// AI call limit check that surfaces lookup errors
    pub async fn try_check_ai_call_limit(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<QuotaCheck, QuotaError> {
        let user = self.load_user(user_id).await?;
        let plan = user.plan_tier();
        let limit = PlanLimits::for_plan(plan).max_ai_calls;

        let mut current = user.ai_calls_used.max(0) as u32;
        if needs_monthly_reset(user.ai_calls_reset_date, now) {
            info!(
                user_id = %user_id,
                previous = current,
                last_reset = %user.ai_calls_reset_date,
                "Resetting monthly AI call counter"
            );
            User::reset_ai_calls(&self.db, user_id, now).await?;
            current = 0;
        }

        if can_make_ai_call(plan, current) {
            Ok(QuotaCheck::allowed(current, limit))
        } else {
            info!(user_id = %user_id, current, limit, "AI call limit reached");
            Ok(QuotaCheck::exceeded(
                QuotaKind::AiCalls,
                plan,
                current,
                limit,
                &self.upgrade_url,
            ))
        }
    }

    /// Records one AI call against the user's monthly counter
    ///
    /// The increment is capped at the plan limit in a single statement, so
    /// concurrent callers that both passed the check cannot push the counter
    /// past the limit. Returns `true` if the counter moved. Errors are logged
    /// and swallowed.
    pub async fn increment_ai_usage(&self, user_id: Uuid) -> bool {
        let user = match User::find_by_id(&self.db, user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(user_id = %user_id, "Cannot increment AI usage for missing user");
                return false;
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to load user for AI usage increment");
                return false;
            }
        };

        let cap = PlanLimits::for_plan(user.plan_tier()).max_ai_calls as i32;

        match User::increment_ai_calls_capped(&self.db, user_id, cap).await {
            Ok(true) => {
                debug!(user_id = %user_id, "AI usage incremented");
                true
            }
            Ok(false) => {
                warn!(user_id = %user_id, cap, "AI usage increment skipped at cap");
                false
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to increment AI usage");
                false
            }
        }
    }

    /// Appends a usage log entry; errors are logged and swallowed
    pub async fn log_usage(&self, user_id: Uuid, action: &str, launch_id: Option<Uuid>) {
        if let Err(e) = UsageLog::create(&self.db, user_id, action, launch_id).await {
            error!(user_id = %user_id, action, error = %e, "Failed to write usage log");
        }
    }

    /// Reads plan, limits and current usage for display
    ///
    /// A stale monthly counter is reported as zero without being written.
    pub async fn usage_summary(&self, user_id: Uuid) -> Result<UsageSummary, QuotaError> {
        let user = self.load_user(user_id).await?;
        let plan = user.plan_tier();
        let launches_used = Launch::count_slots_used(&self.db, user_id).await? as u32;

        let ai_calls_used = if needs_monthly_reset(user.ai_calls_reset_date, Utc::now()) {
            0
        } else {
            user.ai_calls_used.max(0) as u32
        };

        Ok(UsageSummary {
            plan,
            limits: PlanLimits::for_plan(plan),
            launches_used,
            ai_calls_used,
            ai_calls_reset_date: user.ai_calls_reset_date,
        })
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, QuotaError> {
        User::find_by_id(&self.db, user_id)
            .await?
            .ok_or(QuotaError::UserNotFound(user_id))
    }
}
