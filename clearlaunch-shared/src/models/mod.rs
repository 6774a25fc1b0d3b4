/// Database models for ClearLaunch
///
/// Each model owns its row struct and its queries.
///
/// # Models
///
/// - `user`: accounts, subscription plan and the monthly AI-call counter
/// - `business_profile`: onboarding profile that feeds prompt context
/// - `launch`: launches and their platform selection
/// - `task`: launch tasks
/// - `usage_log`: metered-action audit trail
/// - `early_access`: waitlist signups
///
/// # Example
///
/// ```no_run
/// use clearlaunch_shared::models::launch::{Launch, LaunchStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let active = Launch::list_by_user(&pool, user_id, Some(LaunchStatus::Active)).await?;
/// println!("{} active launches", active.len());
/// # Ok(())
/// # }
/// ```

pub mod business_profile;
pub mod early_access;
pub mod launch;
pub mod task;
pub mod usage_log;
pub mod user;
