/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use clearlaunch_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = clearlaunch_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::clients::{
    email::{Mailer, ResendMailer},
    llm::{LlmClient, OpenAiClient},
    stripe::{PaymentProvider, StripeProvider},
};
use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use clearlaunch_shared::auth::middleware::{jwt_auth_middleware, AuthError};
use clearlaunch_shared::quota::UsageGuard;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Plan limit checks and usage accounting
    pub guard: UsageGuard,

    /// Completion provider for plan, task and copy generation
    pub llm: Arc<dyn LlmClient>,

    /// Checkout and billing portal
    pub payments: Arc<dyn PaymentProvider>,

    /// Transactional email
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates application state backed by the real providers
    pub fn new(db: PgPool, config: Config) -> Self {
        let llm = Arc::new(OpenAiClient::new(config.llm.clone()));
        let payments = Arc::new(StripeProvider::new(config.stripe.clone()));
        let mailer = Arc::new(ResendMailer::new(config.email.clone()));

        Self::with_clients(db, config, llm, payments, mailer)
    }

    /// Creates application state with explicit provider implementations
    pub fn with_clients(
        db: PgPool,
        config: Config,
        llm: Arc<dyn LlmClient>,
        payments: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let guard = UsageGuard::new(db.clone(), config.upgrade_url());

        Self {
            db,
            config: Arc::new(config),
            guard,
            llm,
            payments,
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/{register,login,refresh}   (public)
///     ├── /early-access                    (public)
///     ├── /billing/webhook                 (Stripe signature)
///     ├── /billing/{checkout,portal}
///     ├── /profile                     GET, PUT
///     ├── /usage                       GET
///     ├── /calendar.ics                GET
///     ├── /launches                    GET, POST
///     ├── /launches/:id                GET, PATCH, DELETE
///     ├── /launches/:id/{archive,unarchive,reset,resync,plan,tasks}   POST
///     ├── /launches/:id/calendar.ics   GET
///     ├── /tasks/:id                   PATCH, DELETE
///     └── /tasks/:id/{regenerate,copy} POST
/// ```
///
/// Everything outside the public group requires a JWT access token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let public_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/early-access", post(routes::early_access::signup))
        .route("/billing/webhook", post(routes::billing::webhook));

    // Everything below requires JWT authentication
    let protected_routes = Router::new()
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/usage", get(routes::usage::get_usage))
        .route("/calendar.ics", get(routes::calendar::user_calendar))
        .route(
            "/launches",
            get(routes::launches::list_launches).post(routes::launches::create_launch),
        )
        .route(
            "/launches/:id",
            get(routes::launches::get_launch)
                .patch(routes::launches::update_launch)
                .delete(routes::launches::delete_launch),
        )
        .route("/launches/:id/archive", post(routes::launches::archive_launch))
        .route("/launches/:id/unarchive", post(routes::launches::unarchive_launch))
        .route("/launches/:id/reset", post(routes::launches::reset_launch))
        .route("/launches/:id/resync", post(routes::launches::resync_launch))
        .route("/launches/:id/tasks", post(routes::launches::create_task))
        .route("/launches/:id/plan", post(routes::ai::generate_plan))
        .route("/launches/:id/calendar.ics", get(routes::calendar::launch_calendar))
        .route(
            "/tasks/:id",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/regenerate", post(routes::ai::regenerate_task))
        .route("/tasks/:id/copy", post(routes::ai::generate_copy))
        .route("/billing/checkout", post(routes::billing::checkout))
        .route("/billing/portal", post(routes::billing::portal))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.cors_permissive() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(state.config.api.production)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next).await
}
