use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{ActivityEntry, CreateActivityInput, EntityType};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Log a new activity
    pub async fn log_activity(&self, request: CreateActivityInput) -> Result<ActivityEntry> {
        let metadata_json = request
            .metadata
            .map(|m| serde_json::to_string(&m).unwrap_or_default());

        let entry = sqlx::query_as::<_, ActivityEntry>(
            r#"
            INSERT INTO activity_log (company_id, entity_type, entity_id, action, description, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, company_id, entity_type, entity_id, action, description, metadata, created_at
            "#,
        )
        .bind(request.company_id)
        .bind(request.entity_type)
        .bind(request.entity_id)
        .bind(&request.action)
        .bind(&request.description)
        .bind(metadata_json)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn find_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, company_id, entity_type, entity_id, action, description, metadata, created_at
            FROM activity_log
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
