/// Configuration management for the API server
///
/// Configuration is read from process environment variables, with a `.env`
/// file loaded first in development.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
/// - `CORS_ORIGINS`: comma-separated allow-list, `*` for permissive (default `*`)
/// - `APP_ENV`: `production` enables strict CORS credentials (default `development`)
/// - `APP_URL`: public web app URL, used for redirects and upgrade links
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_SECRET`: signing key, at least 32 characters (required)
/// - `LLM_API_KEY`, `LLM_BASE_URL`, `LLM_MODEL`: chat-completions provider
/// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`, `STRIPE_PRICE_PRO`, `STRIPE_PRICE_POWER`
/// - `RESEND_API_KEY`, `EMAIL_FROM`: transactional email
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
///
/// Provider keys are optional at startup; a missing key surfaces as an
/// upstream error when that provider is first called.
///
/// # Example
///
/// ```no_run
/// use clearlaunch_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use clearlaunch_shared::models::user::Plan;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMAIL_FROM: &str = "ClearLaunch <hello@clearlaunch.app>";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub llm: LlmConfig,
    pub stripe: StripeConfig,
    pub email: EmailConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Running in production
    pub production: bool,

    /// Public base URL of the web app, without trailing slash
    pub app_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Stripe configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub price_pro: Option<String>,
    pub price_power: Option<String>,
}

impl StripeConfig {
    /// Price ID for a paid plan
    pub fn price_for(&self, plan: Plan) -> Option<&str> {
        match plan {
            Plan::Free => None,
            Plan::Pro => self.price_pro.as_deref(),
            Plan::Power => self.price_power.as_deref(),
        }
    }

    /// Plan a price ID belongs to
    pub fn plan_for_price(&self, price_id: &str) -> Option<Plan> {
        if self.price_pro.as_deref() == Some(price_id) {
            Some(Plan::Pro)
        } else if self.price_power.as_deref() == Some(price_id) {
            Some(Plan::Power)
        } else {
            None
        }
    }
}

/// Transactional email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub from: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let production = var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let app_url = var("APP_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let log_format = match var("LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                app_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            llm: LlmConfig {
                api_key: var("LLM_API_KEY"),
                base_url: var("LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            },
            stripe: StripeConfig {
                secret_key: var("STRIPE_SECRET_KEY"),
                webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
                price_pro: var("STRIPE_PRICE_PRO"),
                price_power: var("STRIPE_PRICE_POWER"),
            },
            email: EmailConfig {
                api_key: var("RESEND_API_KEY"),
                from: var("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Where quota denials send the user
    pub fn upgrade_url(&self) -> String {
        format!("{}/pricing", self.api.app_url)
    }

    /// Whether every origin is allowed
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}
