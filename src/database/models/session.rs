use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

/// One clock-in-to-clock-out record for an employee, possibly containing
/// breaks. Rows are never deleted; status only moves forward through
/// `open -> pending_approval -> {approved | rejected}`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkSession {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
    /// Net worked time: (clock_out - clock_in) minus break time. Set at
    /// clock-out, never recomputed afterwards.
    pub worked_minutes: Option<i64>,
    pub status: SessionStatus,
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionBreak {
    pub id: Uuid,
    pub session_id: Uuid,
    pub break_start: NaiveDateTime,
    pub break_end: Option<NaiveDateTime>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SessionStatus {
        Open => "open",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Rejected => "rejected",
    }
}
