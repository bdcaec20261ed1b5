use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Company, CompanyInput, JobRole, JobRoleInput};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_company(&self, input: CompanyInput) -> Result<Company> {
        let now = Utc::now().naive_utc();

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, payment_cycle, max_daily_hours, bonus_rate_multiplier, timezone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, payment_cycle, max_daily_hours, bonus_rate_multiplier, timezone, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.payment_cycle)
        .bind(input.max_daily_hours)
        .bind(input.bonus_rate_multiplier)
        .bind(&input.timezone)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, payment_cycle, max_daily_hours, bonus_rate_multiplier, timezone, created_at, updated_at
            FROM companies
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn create_job_role(&self, input: JobRoleInput) -> Result<JobRole> {
        let now = Utc::now().naive_utc();

        let role = sqlx::query_as::<_, JobRole>(
            r#"
            INSERT INTO job_roles (id, company_id, name, base_rate, overtime_rate, bonus_rate, bonus_hours, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, company_id, name, base_rate, overtime_rate, bonus_rate, bonus_hours, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.company_id)
        .bind(&input.name)
        .bind(&input.base_rate)
        .bind(&input.overtime_rate)
        .bind(&input.bonus_rate)
        .bind(input.bonus_hours)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    pub async fn find_job_role(&self, id: Uuid) -> Result<Option<JobRole>> {
        let role = sqlx::query_as::<_, JobRole>(
            r#"
            SELECT id, company_id, name, base_rate, overtime_rate, bonus_rate, bonus_hours, created_at, updated_at
            FROM job_roles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }
}
