use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Employee, EmployeeInput};

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_employee(&self, input: EmployeeInput) -> Result<Employee> {
        let now = Utc::now().naive_utc();

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (id, company_id, job_role_id, name, wallet_number, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING id, company_id, job_role_id, name, wallet_number, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.company_id)
        .bind(input.job_role_id)
        .bind(&input.name)
        .bind(&input.wallet_number)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, company_id, job_role_id, name, wallet_number, is_active, created_at, updated_at
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_active_by_company(&self, company_id: Uuid) -> Result<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, company_id, job_role_id, name, wallet_number, is_active, created_at, updated_at
            FROM employees
            WHERE company_id = ? AND is_active = 1
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<Employee>> {
        let now = Utc::now().naive_utc();

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees
            SET is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, company_id, job_role_id, name, wallet_number, is_active, created_at, updated_at
            "#,
        )
        .bind(is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}
