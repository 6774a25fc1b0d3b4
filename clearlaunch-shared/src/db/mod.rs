/// Database layer for ClearLaunch
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded migration runner
///
/// Models and their queries live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
