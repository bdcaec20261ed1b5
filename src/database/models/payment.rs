use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use super::money::Money;

/// A batch of approved sessions converted into money for one employee over
/// one period. Mutated only by the disbursement state machine, never
/// deleted. The payment id doubles as the provider idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub bonus_hours: f64,
    pub amount: Money,
    pub status: PaymentStatus,
    pub provider_transaction_id: Option<String>,
    pub attempt_count: i64,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// What the ledger wants to persist; ids and timestamps are assigned by the
/// repository at reserve time.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub bonus_hours: f64,
    pub amount: Money,
}

/// Reverse-index row: which payment claimed a session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentClaim {
    pub session_id: Uuid,
    pub payment_id: Uuid,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        Pending => "pending",
        Approved => "approved",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl PaymentStatus {
    /// Whether the disbursement state machine has finished with this
    /// payment.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }
}
