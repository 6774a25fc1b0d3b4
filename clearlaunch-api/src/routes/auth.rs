/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new pair

use crate::{
    app::AppState,
    clients::email::welcome_email,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use clearlaunch_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

/// Register a new user
///
/// Creates an account on the free plan and sends a welcome email in the
/// background. Email failures are logged and never fail the request.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "SecureP@ss123", "name": "Ada" }
/// ```
///
/// # Response
///
/// ```json
/// { "user": { "id": "uuid", "plan": "free", ... }, "access_token": "eyJ...", "refresh_token": "eyJ...", "expires_in": 86400 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::validation("password", e))?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::validation("email", "Email is already registered"));
    }

    let password_hash = password::hash_password(&req.password)?;

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name,
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    let mailer = state.mailer.clone();
    let message = welcome_email(&user.email, user.name.as_deref(), &state.config.api.app_url);
    let user_id = user.id;
    tokio::spawn(async move {
        if let Err(e) = mailer.send(message).await {
            tracing::warn!(user_id = %user_id, error = %e, "Welcome email not sent");
        }
    });

    Ok(Json(AuthResponse { user, tokens }))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "SecureP@ss123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok(Json(AuthResponse { user, tokens }))
}

/// Token refresh endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// Content-Type: application/json
///
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<jwt::TokenPair>> {
    let tokens = jwt::refresh_token_pair(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(tokens))
}
