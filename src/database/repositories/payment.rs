use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Payment, PaymentClaim, PaymentDraft};
use crate::error::AppError;

const PAYMENT_COLUMNS: &str = "id, employee_id, company_id, period_start, period_end, regular_hours, overtime_hours, bonus_hours, amount, status, provider_transaction_id, attempt_count, failure_reason, created_at, updated_at";

/// Persistence for payments and the session reverse index.
///
/// `payment_sessions.session_id` is a primary key, so claiming a session a
/// second time fails at write time. Guarded UPDATEs implement the
/// disbursement state machine; a transition whose guard matches nothing
/// returns `None` and the caller decides what that means.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Atomically create the payment and claim its sessions. Returns
    /// `Ok(None)` when another payroll run claimed any of the sessions
    /// first (unique violation on the reverse index); the whole transaction
    /// rolls back in that case.
    pub async fn reserve_and_create(
        &self,
        draft: &PaymentDraft,
        session_ids: &[Uuid],
    ) -> Result<Option<Payment>, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, employee_id, company_id, period_start, period_end, regular_hours, overtime_hours, bonus_hours, amount, status, attempt_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0, ?, ?)
            "#,
        )
        .bind(id)
        .bind(draft.employee_id)
        .bind(draft.company_id)
        .bind(draft.period_start)
        .bind(draft.period_end)
        .bind(draft.regular_hours)
        .bind(draft.overtime_hours)
        .bind(draft.bonus_hours)
        .bind(&draft.amount)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for session_id in session_ids {
            let inserted = sqlx::query(
                "INSERT INTO payment_sessions (session_id, payment_id) VALUES (?, ?)",
            )
            .bind(session_id)
            .bind(id)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    log::warn!(
                        "session {} already claimed by another payment, rolling back reservation {}",
                        session_id,
                        id
                    );
                    tx.rollback().await?;
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }

        tx.commit().await?;

        let payment = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::internal_server_error_message("payment missing right after reservation")
        })?;

        Ok(Some(payment))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_company(&self, company_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE company_id = ? ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn claims_for_payment(&self, payment_id: Uuid) -> Result<Vec<PaymentClaim>, AppError> {
        let claims = sqlx::query_as::<_, PaymentClaim>(
            "SELECT session_id, payment_id FROM payment_sessions WHERE payment_id = ?",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }

    pub async fn claim_for_session(&self, session_id: Uuid) -> Result<Option<PaymentClaim>, AppError> {
        let claim = sqlx::query_as::<_, PaymentClaim>(
            "SELECT session_id, payment_id FROM payment_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// `pending -> approved`
    pub async fn mark_approved(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        self.guarded_transition(id, "approved", &["pending"], None)
            .await
    }

    /// `approved -> processing`
    pub async fn mark_processing(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        self.guarded_transition(id, "processing", &["approved"], None)
            .await
    }

    /// `pending|approved -> cancelled`. Claimed sessions are not released.
    pub async fn mark_cancelled(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        self.guarded_transition(id, "cancelled", &["pending", "approved"], None)
            .await
    }

    /// `processing -> failed`
    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Option<Payment>, AppError> {
        self.guarded_transition(id, "failed", &["processing"], Some(reason))
            .await
    }

    /// Bump the persisted attempt counter for a processing payment.
    pub async fn increment_attempts(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        let now = Utc::now().naive_utc();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET attempt_count = attempt_count + 1, updated_at = ?
            WHERE id = ? AND status = 'processing'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Remember the provider's transaction id the first time it shows up.
    pub async fn record_provider_transaction(
        &self,
        id: Uuid,
        transaction_id: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET provider_transaction_id = ?, updated_at = ?
            WHERE id = ? AND provider_transaction_id IS NULL
            "#,
        )
        .bind(transaction_id)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Callback-driven `processing -> completed`. The status guard makes
    /// duplicate deliveries a no-op: only the first one matches.
    pub async fn complete_from_callback(
        &self,
        id: Uuid,
        transaction_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        let now = Utc::now().naive_utc();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'completed', provider_transaction_id = ?, updated_at = ?
            WHERE id = ? AND status = 'processing'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Callback-driven `processing -> failed`.
    pub async fn fail_from_callback(
        &self,
        id: Uuid,
        transaction_id: &str,
        reason: &str,
    ) -> Result<Option<Payment>, AppError> {
        let now = Utc::now().naive_utc();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'failed', provider_transaction_id = ?, failure_reason = ?, updated_at = ?
            WHERE id = ? AND status = 'processing'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .bind(reason)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn guarded_transition(
        &self,
        id: Uuid,
        to: &str,
        from: &[&str],
        failure_reason: Option<&str>,
    ) -> Result<Option<Payment>, AppError> {
        let now = Utc::now().naive_utc();
        let placeholders = vec!["?"; from.len()].join(", ");

        let query = format!(
            r#"
            UPDATE payments
            SET status = ?, failure_reason = COALESCE(?, failure_reason), updated_at = ?
            WHERE id = ? AND status IN ({placeholders})
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let mut q = sqlx::query_as::<_, Payment>(&query)
            .bind(to)
            .bind(failure_reason)
            .bind(now)
            .bind(id);
        for status in from {
            q = q.bind(*status);
        }

        let payment = q.fetch_optional(&self.pool).await?;

        Ok(payment)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}
