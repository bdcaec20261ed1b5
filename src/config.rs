use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Base URL of the mobile-money disbursement provider.
    pub provider_base_url: String,
    pub provider_api_key: String,
    /// Shared secret the provider signs webhook deliveries with.
    pub provider_webhook_secret: String,
    pub provider_timeout_secs: u64,
    /// Upper bound on disbursement attempts before a payment is forced to
    /// failed for manual reconciliation.
    pub max_disbursement_attempts: u32,
    pub disbursement_backoff_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:paylinkr.db".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.provider.example".to_string()),
            provider_api_key: env::var("PROVIDER_API_KEY")
                .unwrap_or_else(|_| "sandbox-api-key".to_string()),
            provider_webhook_secret: env::var("PROVIDER_WEBHOOK_SECRET")
                .unwrap_or_else(|_| "change-this-webhook-secret".to_string()),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            max_disbursement_attempts: env::var("MAX_DISBURSEMENT_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            disbursement_backoff_ms: env::var("DISBURSEMENT_BACKOFF_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
