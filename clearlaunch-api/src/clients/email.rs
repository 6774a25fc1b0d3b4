/// Transactional email via Resend
///
/// Sends are fire-and-forget from the caller's point of view: handlers spawn
/// them and log failures without affecting the response.

use crate::config::EmailConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Email send error
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email provider is not configured")]
    NotConfigured,

    #[error("Email request failed: {0}")]
    Request(String),

    #[error("Email provider returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// An outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Transactional email sender
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    message: String,
}

/// Resend HTTP client
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    config: EmailConfig,
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let api_key = self.config.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let body = ResendRequest {
            from: &self.config.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ResendError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            error!(status = %status, message = %message, "Resend API error");
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Email sent");
        Ok(())
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Welcome email sent after registration
pub fn welcome_email(to: &str, name: Option<&str>, app_url: &str) -> EmailMessage {
    let greeting = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {},", escape_html(name)),
        None => "Hi there,".to_string(),
    };

    let html = format!(
        "<p>{greeting}</p>\
         <p>Welcome to ClearLaunch! Tell us about your business, create your first launch \
         and we'll map out every task between today and launch day.</p>\
         <p><a href=\"{app_url}/onboarding\">Set up your business profile</a></p>\
         <p>The ClearLaunch team</p>"
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Welcome to ClearLaunch".to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_email_greets_by_name() {
        let email = welcome_email("ada@example.com", Some("Ada"), "https://clearlaunch.app");

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Welcome to ClearLaunch");
        assert!(email.html.starts_with("<p>Hi Ada,</p>"));
        assert!(email.html.contains("https://clearlaunch.app/onboarding"));
    }

    #[test]
    fn test_welcome_email_escapes_and_falls_back() {
        let email = welcome_email("x@example.com", Some("<script>"), "https://clearlaunch.app");
        assert!(email.html.contains("Hi &lt;script&gt;,"));

        let anonymous = welcome_email("x@example.com", Some("   "), "https://clearlaunch.app");
        assert!(anonymous.html.starts_with("<p>Hi there,</p>"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let mailer = ResendMailer::new(EmailConfig {
            api_key: None,
            from: "ClearLaunch <hello@clearlaunch.app>".to_string(),
        });
        let result = mailer
            .send(welcome_email("x@example.com", None, "https://clearlaunch.app"))
            .await;
        assert!(matches!(result, Err(MailError::NotConfigured)));
    }
}
