use std::collections::HashMap;

use anyhow::Result;
use uuid::Uuid;

use crate::database::models::{CreateActivityInput, EntityType};
use crate::database::repositories::ActivityRepository;

/// Records state transitions on sessions and payments into the append-only
/// audit trail. Logging failures are reported to the caller, which usually
/// downgrades them to a warning rather than failing the request.
#[derive(Clone)]
pub struct ActivityLogger {
    repository: ActivityRepository,
}

impl ActivityLogger {
    pub fn new(repository: ActivityRepository) -> Self {
        Self { repository }
    }

    /// Log a work-session transition
    pub async fn log_session_activity(
        &self,
        company_id: Uuid,
        session_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let request = CreateActivityInput {
            company_id,
            entity_type: EntityType::Session,
            entity_id: session_id,
            action: action.to_string(),
            description,
            metadata,
        };

        self.repository.log_activity(request).await?;
        Ok(())
    }

    /// Log a payment transition
    pub async fn log_payment_activity(
        &self,
        company_id: Uuid,
        payment_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let request = CreateActivityInput {
            company_id,
            entity_type: EntityType::Payment,
            entity_id: payment_id,
            action: action.to_string(),
            description,
            metadata,
        };

        self.repository.log_activity(request).await?;
        Ok(())
    }

    pub fn metadata(pairs: Vec<(&str, String)>) -> HashMap<String, serde_json::Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect()
    }
}
