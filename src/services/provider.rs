use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::Money;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Timeout or transport failure: the transfer may or may not have
    /// reached the provider. Safe to retry under the same idempotency key.
    #[error("provider request failed: {0}")]
    Transient(String),

    /// The provider explicitly rejected the transfer (invalid wallet,
    /// insufficient float). Retrying will not help.
    #[error("transfer rejected by provider: {0}")]
    Terminal(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Payment id, reused verbatim as the provider idempotency key so a
    /// retried request cannot move money twice.
    pub idempotency_key: Uuid,
    pub wallet_number: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAck {
    pub transaction_id: String,
}

/// Outbound money movement. The orchestrator only ever talks to this trait;
/// tests substitute a scripted mock.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn request_transfer(&self, request: &TransferRequest)
        -> Result<TransferAck, ProviderError>;
}

/// reqwest-backed client for the real mobile-money provider.
pub struct HttpProviderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpProviderClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
            api_key: config.provider_api_key.clone(),
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn request_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferAck, ProviderError> {
        let url = format!("{}/v1/transfers", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", request.idempotency_key.to_string())
            .json(request)
            .send()
            .await
            .map_err(|err| ProviderError::Transient(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<TransferAck>()
                .await
                .map_err(|err| ProviderError::Transient(format!("invalid provider response: {}", err)))
        } else if status.is_server_error() {
            Err(ProviderError::Transient(format!(
                "provider returned {}",
                status
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::Terminal(format!(
                "provider returned {}: {}",
                status, body
            )))
        }
    }
}
