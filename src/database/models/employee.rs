use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRole {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub base_rate: Money,
    pub overtime_rate: Money,
    /// Flat role bonus added on top of the hourly amounts, scaled by the
    /// company's bonus multiplier at calculation time.
    pub bonus_rate: Money,
    /// Configured flat bonus-hours add-on; reported on payments, also scaled
    /// by the company multiplier.
    pub bonus_hours: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRoleInput {
    pub company_id: Uuid,
    pub name: String,
    pub base_rate: Money,
    pub overtime_rate: Money,
    pub bonus_rate: Money,
    pub bonus_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub job_role_id: Uuid,
    pub name: String,
    /// Mobile-money wallet the disbursement provider pays into.
    pub wallet_number: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub company_id: Uuid,
    pub job_role_id: Uuid,
    pub name: String,
    pub wallet_number: String,
}
