/// Billing endpoints
///
/// - `POST /v1/billing/checkout` - start a subscription checkout for `pro` or `power`
/// - `POST /v1/billing/portal` - open the Stripe billing portal
/// - `POST /v1/billing/webhook` - Stripe events (signature-verified, no JWT)

use crate::{
    app::AppState,
    clients::stripe::{
        subscription_change, BillingError, CheckoutRequest, CheckoutSession, SubscriptionTarget,
        WebhookVerifier,
    },
    error::{ApiError, ApiResult},
};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use clearlaunch_shared::{
    auth::middleware::AuthContext,
    models::user::{Plan, SubscriptionUpdate, User},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    /// `pro` or `power`
    pub plan: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortalResponse {
    pub url: String,
}

async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account not found".to_string()))
}

/// Start a checkout session
///
/// Creates the Stripe customer on first use and stores its ID on the user.
///
/// # Endpoint
///
/// ```text
/// POST /v1/billing/checkout
/// { "plan": "pro" }
/// ```
///
/// # Response
///
/// ```json
/// { "session_id": "cs_...", "url": "https://checkout.stripe.com/..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown or free plan
/// - `500 Internal Server Error`: Stripe failed or is not configured
pub async fn checkout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CheckoutBody>,
) -> ApiResult<Json<CheckoutSession>> {
    let plan = Plan::parse(body.plan.trim())
        .filter(Plan::is_paid)
        .ok_or_else(|| ApiError::validation("plan", "Plan must be pro or power"))?;

    let user = current_user(&state, &auth).await?;

    let customer_id = match user.stripe_customer_id {
        Some(id) => id,
        None => {
            let id = state
                .payments
                .create_customer(&user.email, user.name.as_deref())
                .await?;
            User::update_subscription(
                &state.db,
                user.id,
                SubscriptionUpdate {
                    stripe_customer_id: Some(id.clone()),
                    ..Default::default()
                },
            )
            .await?;
            id
        }
    };

    let app_url = &state.config.api.app_url;
    let success_url = format!("{}/dashboard?checkout=success", app_url);
    let cancel_url = state.config.upgrade_url();

    let session = state
        .payments
        .create_checkout_session(CheckoutRequest {
            customer_id: &customer_id,
            plan,
            user_id: user.id,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    tracing::info!(user_id = %user.id, plan = plan.as_str(), "Checkout session created");
    Ok(Json(session))
}

/// Open the billing portal
///
/// # Errors
///
/// - `400 Bad Request`: The user has never checked out
pub async fn portal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PortalResponse>> {
    let user = current_user(&state, &auth).await?;
    let customer_id = user
        .stripe_customer_id
        .ok_or_else(|| ApiError::BadRequest("No billing account for this user".to_string()))?;

    let return_url = format!("{}/settings", state.config.api.app_url);
    let url = state
        .payments
        .create_portal_session(&customer_id, &return_url)
        .await?;

    Ok(Json(PortalResponse { url }))
}

/// Receive a Stripe webhook
///
/// Verifies the signature, then syncs plan and subscription fields for the
/// referenced user. Events for unknown customers are acknowledged and logged.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid signature, or unparseable event
/// - `500 Internal Server Error`: Webhook secret not configured
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> ApiResult<Json<Value>> {
    let secret = state
        .config
        .stripe
        .webhook_secret
        .as_deref()
        .ok_or(BillingError::NotConfigured("STRIPE_WEBHOOK_SECRET"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let event = WebhookVerifier::new(secret).verify_and_parse(
        &payload,
        signature,
        Utc::now().timestamp(),
    )?;

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");

    let Some((target, update)) = subscription_change(&event, &state.config.stripe) else {
        return Ok(Json(json!({ "received": true })));
    };

    let user_id = match target {
        SubscriptionTarget::User(id) => Some(id),
        SubscriptionTarget::Customer(customer) => {
            User::find_by_stripe_customer(&state.db, &customer)
                .await?
                .map(|u| u.id)
        }
    };

    match user_id {
        Some(user_id) => {
            let plan = update.plan;
            match User::update_subscription(&state.db, user_id, update).await? {
                Some(user) => tracing::info!(
                    user_id = %user.id,
                    plan = %user.plan,
                    changed = plan.is_some(),
                    "Subscription synced"
                ),
                None => tracing::warn!(user_id = %user_id, "Webhook references unknown user"),
            }
        }
        None => tracing::warn!(event_id = %event.id, "Webhook customer not linked to any user"),
    }

    Ok(Json(json!({ "received": true })))
}
