use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub payment_cycle: PaymentCycle,
    /// Per-day overtime threshold: hours above this are paid at the
    /// overtime rate.
    pub max_daily_hours: f64,
    /// Company-level scalar applied to a role's flat bonus component.
    pub bonus_rate_multiplier: f64,
    /// IANA timezone name used to group sessions into calendar days.
    pub timezone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub name: String,
    pub payment_cycle: PaymentCycle,
    pub max_daily_hours: f64,
    pub bonus_rate_multiplier: f64,
    pub timezone: String,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentCycle {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}
