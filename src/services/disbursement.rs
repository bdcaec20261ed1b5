use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{Payment, PaymentStatus};
use crate::database::repositories::{EmployeeRepository, PaymentRepository};
use crate::error::AppError;
use crate::services::activity_logger::ActivityLogger;
use crate::services::provider::{ProviderClient, ProviderError, TransferRequest};

/// Outcome reported by the provider webhook.
#[derive(Debug, Clone)]
pub enum CallbackResult {
    Completed,
    Failed { reason: String },
}

/// Drives a payment through `pending -> approved -> processing ->
/// {completed | failed}`, with `cancelled` reachable only before the first
/// provider call. Every transition is a guarded UPDATE, so duplicate
/// webhooks and concurrent disburse calls settle on one winner.
#[derive(Clone)]
pub struct DisbursementService {
    payments: PaymentRepository,
    employees: EmployeeRepository,
    provider: Arc<dyn ProviderClient>,
    activity: ActivityLogger,
    max_attempts: u32,
    base_backoff: Duration,
}

impl DisbursementService {
    pub fn new(
        payments: PaymentRepository,
        employees: EmployeeRepository,
        provider: Arc<dyn ProviderClient>,
        activity: ActivityLogger,
        config: &Config,
    ) -> Self {
        Self {
            payments,
            employees,
            provider,
            activity,
            max_attempts: config.max_disbursement_attempts.max(1),
            base_backoff: Duration::from_millis(config.disbursement_backoff_ms),
        }
    }

    /// `pending -> approved`. The HTTP layer follows up by spawning
    /// `disburse` for the approved payment.
    pub async fn approve(&self, payment_id: Uuid) -> Result<Payment, AppError> {
        match self.payments.mark_approved(payment_id).await? {
            Some(payment) => {
                self.log_transition(&payment, "approved", "Payment approved for disbursement")
                    .await;
                Ok(payment)
            }
            None => Err(self.transition_error(payment_id, "approve").await?),
        }
    }

    /// `pending|approved -> cancelled`. Once a provider call may have been
    /// made the payment can no longer be cancelled, and its sessions stay
    /// claimed either way.
    pub async fn cancel(&self, payment_id: Uuid) -> Result<Payment, AppError> {
        match self.payments.mark_cancelled(payment_id).await? {
            Some(payment) => {
                self.log_transition(&payment, "cancelled", "Payment cancelled").await;
                Ok(payment)
            }
            None => Err(self.transition_error(payment_id, "cancel").await?),
        }
    }

    /// `approved -> processing`, then up to `max_attempts` provider calls
    /// under the payment-id idempotency key. Transient failures back off
    /// and retry; a terminal rejection or retry exhaustion forces `failed`.
    pub async fn disburse(&self, payment_id: Uuid) -> Result<Payment, AppError> {
        let payment = match self.payments.mark_processing(payment_id).await? {
            Some(payment) => payment,
            None => return Err(self.transition_error(payment_id, "disburse").await?),
        };

        let employee = self
            .employees
            .find_by_id(payment.employee_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Employee {} not found", payment.employee_id))
            })?;

        let request = TransferRequest {
            idempotency_key: payment.id,
            wallet_number: employee.wallet_number.clone(),
            amount: payment.amount.clone(),
        };

        self.log_transition(&payment, "processing", "Disbursement started")
            .await;

        for attempt in 1..=self.max_attempts {
            // A webhook may have settled the payment while we were backing
            // off; the attempt counter only moves for live payments.
            let current = match self.payments.increment_attempts(payment_id).await? {
                Some(payment) => payment,
                None => return self.require_payment(payment_id).await,
            };

            match self.provider.request_transfer(&request).await {
                Ok(ack) => {
                    self.payments
                        .record_provider_transaction(payment_id, &ack.transaction_id)
                        .await?;
                    log::info!(
                        "payment {} accepted by provider (transaction {}), awaiting callback",
                        payment_id,
                        ack.transaction_id
                    );
                    return self.require_payment(payment_id).await;
                }
                Err(ProviderError::Terminal(reason)) => {
                    log::error!("payment {} rejected by provider: {}", payment_id, reason);
                    return self.force_failed(payment_id, &reason).await;
                }
                Err(ProviderError::Transient(reason)) => {
                    log::warn!(
                        "payment {} disbursement attempt {}/{} failed: {}",
                        payment_id,
                        current.attempt_count,
                        self.max_attempts,
                        reason
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        // Indeterminate: money may or may not have moved. Surface it for
        // manual reconciliation instead of retrying past the bound.
        self.force_failed(
            payment_id,
            "disbursement attempts exhausted without provider confirmation; manual reconciliation required",
        )
        .await
    }

    /// Apply a provider webhook. Idempotent: replaying a delivery for a
    /// payment that already reached a terminal state with the same
    /// transaction id changes nothing, and a callback for a payment that is
    /// not processing is a logged no-op.
    pub async fn on_provider_callback(
        &self,
        reference: Uuid,
        transaction_id: &str,
        result: CallbackResult,
    ) -> Result<Payment, AppError> {
        let payment = self.require_payment(reference).await?;

        match payment.status {
            PaymentStatus::Processing => {
                let updated = match &result {
                    CallbackResult::Completed => {
                        self.payments
                            .complete_from_callback(reference, transaction_id)
                            .await?
                    }
                    CallbackResult::Failed { reason } => {
                        self.payments
                            .fail_from_callback(reference, transaction_id, reason)
                            .await?
                    }
                };

                match updated {
                    Some(payment) => {
                        let action = payment.status.to_string();
                        self.log_transition(
                            &payment,
                            &action,
                            format!("Provider callback: transaction {}", transaction_id),
                        )
                        .await;
                        Ok(payment)
                    }
                    // A duplicate delivery won the guarded update first;
                    // return whatever it decided.
                    None => self.require_payment(reference).await,
                }
            }
            PaymentStatus::Completed | PaymentStatus::Failed
                if payment.provider_transaction_id.as_deref() == Some(transaction_id) =>
            {
                log::info!(
                    "duplicate provider callback for payment {} (transaction {}), ignoring",
                    reference,
                    transaction_id
                );
                Ok(payment)
            }
            _ => {
                log::warn!(
                    "stale provider callback for payment {} in state {}, ignoring",
                    reference,
                    payment.status
                );
                Ok(payment)
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(8);
        let delay = self.base_backoff.saturating_mul(1 << shift);
        let jitter_bound = (self.base_backoff.as_millis() as u64 / 2).max(1);
        let jitter = rand::rng().random_range(0..jitter_bound);
        delay + Duration::from_millis(jitter)
    }

    async fn force_failed(&self, payment_id: Uuid, reason: &str) -> Result<Payment, AppError> {
        match self.payments.mark_failed(payment_id, reason).await? {
            Some(payment) => {
                self.log_transition(&payment, "failed", reason).await;
                Ok(payment)
            }
            // The callback beat us to a terminal state during the last
            // backoff window.
            None => self.require_payment(payment_id).await,
        }
    }

    async fn require_payment(&self, payment_id: Uuid) -> Result<Payment, AppError> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))
    }

    async fn transition_error(
        &self,
        payment_id: Uuid,
        action: &str,
    ) -> Result<AppError, AppError> {
        match self.payments.find_by_id(payment_id).await? {
            Some(payment) => Ok(AppError::InvalidTransition(format!(
                "cannot {} a {} payment",
                action, payment.status
            ))),
            None => Ok(AppError::NotFound(format!(
                "Payment {} not found",
                payment_id
            ))),
        }
    }

    async fn log_transition(&self, payment: &Payment, action: &str, description: impl Into<String>) {
        if let Err(e) = self
            .activity
            .log_payment_activity(
                payment.company_id,
                payment.id,
                action,
                description.into(),
                None,
            )
            .await
        {
            log::warn!("Failed to log payment activity: {}", e);
        }
    }
}
