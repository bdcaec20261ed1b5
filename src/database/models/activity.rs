use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

/// Append-only audit row recording a single state transition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub company_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: String,
    pub description: String,
    pub metadata: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateActivityInput {
    pub company_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: String,
    pub description: String,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntityType {
        Session => "session",
        Payment => "payment",
    }
}
