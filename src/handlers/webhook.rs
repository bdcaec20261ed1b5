use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestIdExt;
use crate::services::CallbackResult;
use crate::AppState;

const SIGNATURE_HEADER: &str = "X-Provider-Signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCallbackRequest {
    pub reference: Uuid,
    pub transaction_id: String,
    pub status: CallbackStatus,
    pub failure_reason: Option<String>,
}

/// Provider settlement webhook. Replays and out-of-order deliveries are
/// accepted and ignored; only the first delivery for a processing payment
/// settles it.
pub async fn provider_callback(
    req: HttpRequest,
    input: web::Json<ProviderCallbackRequest>,
    config: web::Data<Config>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    if !constant_time_eq(
        signature.as_bytes(),
        config.provider_webhook_secret.as_bytes(),
    ) {
        return Err(AppError::Unauthorized(
            "invalid webhook signature".to_string(),
        ));
    }

    log::info!(
        "provider callback for payment {} (transaction {}, correlation {})",
        input.reference,
        input.transaction_id,
        req.correlation_id().unwrap_or_default()
    );

    let result = match input.status {
        CallbackStatus::Completed => CallbackResult::Completed,
        CallbackStatus::Failed => CallbackResult::Failed {
            reason: input
                .failure_reason
                .clone()
                .unwrap_or_else(|| "declared failed by provider".to_string()),
        },
    };

    let payment = state
        .disbursement
        .on_provider_callback(input.reference, &input.transaction_id, result)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(payment)))
}

// Comparison time must not depend on where the first mismatch is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
