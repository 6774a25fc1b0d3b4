/// Stripe billing client and webhook verification
///
/// Checkout and portal sessions are created through the Stripe REST API with
/// form-encoded requests. Webhooks are verified against the
/// `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`): HMAC-SHA256 over
/// `"{t}.{payload}"`, compared in constant time, with a five-minute
/// timestamp tolerance.

use crate::config::StripeConfig;
use async_trait::async_trait;
use clearlaunch_shared::models::user::{Plan, SubscriptionUpdate};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a webhook signature, in seconds
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Billing error
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Billing is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("Plan {0} cannot be purchased")]
    InvalidPlan(&'static str),

    #[error("Stripe error: {0}")]
    Provider(String),

    #[error("Webhook rejected: {0}")]
    Webhook(String),
}

/// A created checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// Input for a checkout session
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub customer_id: &'a str,
    pub plan: Plan,
    pub user_id: Uuid,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// Subscription billing provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a customer and returns its ID
    async fn create_customer(&self, email: &str, name: Option<&str>) -> Result<String, BillingError>;

    /// Creates a subscription checkout session
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError>;

    /// Creates a billing portal session and returns its URL
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError>;
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePortalSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: String,
}

/// Stripe REST client
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: StripeConfig,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let secret = self
            .config
            .secret_key
            .as_deref()
            .ok_or(BillingError::NotConfigured("STRIPE_SECRET_KEY"))?;

        let response = self
            .client
            .post(format!("{STRIPE_API_BASE}{endpoint}"))
            .basic_auth(secret, Option::<&str>::None)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Stripe API request failed");
                BillingError::Provider(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Stripe API error: {status}"));
            error!(status = %status, message = %message, "Stripe API error");
            return Err(BillingError::Provider(message));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Provider(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self))]
    async fn create_customer(&self, email: &str, name: Option<&str>) -> Result<String, BillingError> {
        debug!("Creating Stripe customer");

        let mut form: Vec<(&str, &str)> = vec![("email", email)];
        if let Some(n) = name {
            form.push(("name", n));
        }

        let customer: StripeCustomer = self.post_form("/customers", &form).await?;
        Ok(customer.id)
    }

    #[instrument(skip(self, request), fields(plan = request.plan.as_str(), user_id = %request.user_id))]
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        debug!("Creating checkout session");

        let price_id = match request.plan {
            Plan::Free => return Err(BillingError::InvalidPlan("free")),
            plan => self.config.price_for(plan).ok_or(BillingError::NotConfigured(
                if plan == Plan::Pro {
                    "STRIPE_PRICE_PRO"
                } else {
                    "STRIPE_PRICE_POWER"
                },
            ))?,
        };

        let user_id = request.user_id.to_string();
        let form = [
            ("customer", request.customer_id),
            ("mode", "subscription"),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("client_reference_id", user_id.as_str()),
            ("metadata[plan]", request.plan.as_str()),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
        ];

        let session: StripeCheckoutSession = self.post_form("/checkout/sessions", &form).await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError> {
        debug!("Creating portal session");

        let form = [("customer", customer_id), ("return_url", return_url)];
        let session: StripePortalSession = self.post_form("/billing_portal/sessions", &form).await?;

        Ok(session.url)
    }
}

/// A verified webhook event
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

/// Verifies `Stripe-Signature` headers
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the hex `v1` signature for a timestamp and payload
    pub fn sign(&self, timestamp: i64, payload: &[u8]) -> Result<String, BillingError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| BillingError::Webhook("Invalid webhook secret".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks a signature header against the payload at time `now` (unix seconds)
    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), BillingError> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in header.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => signatures.push(value),
                    _ => {}
                }
            }
        }

        let timestamp: i64 = timestamp
            .ok_or_else(|| BillingError::Webhook("Missing timestamp".to_string()))?
            .parse()
            .map_err(|_| BillingError::Webhook("Invalid timestamp format".to_string()))?;

        if signatures.is_empty() {
            return Err(BillingError::Webhook("Missing signature".to_string()));
        }

        let expected = self.sign(timestamp, payload)?;
        if !signatures
            .iter()
            .any(|sig| constant_time_eq(sig.as_bytes(), expected.as_bytes()))
        {
            warn!("Webhook signature verification failed");
            return Err(BillingError::Webhook("Signature verification failed".to_string()));
        }

        if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
            warn!(timestamp, now, "Webhook timestamp outside tolerance");
            return Err(BillingError::Webhook("Timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Verifies then parses a webhook event
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify(payload, header, now)?;
        serde_json::from_slice(payload).map_err(|e| BillingError::Webhook(e.to_string()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Which user a subscription change applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionTarget {
    /// Checkout sessions carry our user ID as `client_reference_id`
    User(Uuid),
    Customer(String),
}

fn str_field<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Maps a webhook event to the subscription fields it changes
///
/// Returns `None` for events that do not affect a user's plan.
pub fn subscription_change(
    event: &WebhookEvent,
    config: &StripeConfig,
) -> Option<(SubscriptionTarget, SubscriptionUpdate)> {
    let object = &event.data.object;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let customer = str_field(object, "customer").map(String::from);
            let target = str_field(object, "client_reference_id")
                .and_then(|id| Uuid::parse_str(id).ok())
                .map(SubscriptionTarget::User)
                .or_else(|| customer.clone().map(SubscriptionTarget::Customer))?;

            let plan = object
                .get("metadata")
                .and_then(|m| str_field(m, "plan"))
                .and_then(Plan::parse)
                .filter(Plan::is_paid);

            Some((
                target,
                SubscriptionUpdate {
                    plan,
                    stripe_customer_id: customer,
                    stripe_subscription_id: str_field(object, "subscription").map(String::from),
                    subscription_status: Some("active".to_string()),
                },
            ))
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let customer = str_field(object, "customer")?.to_string();
            let status = str_field(object, "status").unwrap_or("incomplete");

            let plan = match status {
                "active" | "trialing" => object
                    .pointer("/items/data/0/price/id")
                    .and_then(Value::as_str)
                    .and_then(|price| config.plan_for_price(price)),
                "canceled" | "unpaid" | "incomplete_expired" => Some(Plan::Free),
                _ => None,
            };

            Some((
                SubscriptionTarget::Customer(customer.clone()),
                SubscriptionUpdate {
                    plan,
                    stripe_customer_id: Some(customer),
                    stripe_subscription_id: str_field(object, "id").map(String::from),
                    subscription_status: Some(status.to_string()),
                },
            ))
        }
        "customer.subscription.deleted" => {
            let customer = str_field(object, "customer")?.to_string();
            Some((
                SubscriptionTarget::Customer(customer),
                SubscriptionUpdate {
                    plan: Some(Plan::Free),
                    subscription_status: Some("canceled".to_string()),
                    ..Default::default()
                },
            ))
        }
        _ => None,
    }
}
