use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Employee, SessionBreak, SessionStatus, WorkSession};
use crate::error::AppError;

const SESSION_COLUMNS: &str = "id, employee_id, company_id, clock_in, clock_out, worked_minutes, status, rejection_reason, created_at, updated_at";

/// Persistence for the work-session state machine.
///
/// Every transition is a single guarded SQL statement, so concurrent
/// requests for the same employee serialize on the database: two clock-ins
/// racing each other cannot both pass the NOT EXISTS guard.
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new session, atomically checking the exclusivity invariant:
    /// at most one open/pending session per employee.
    pub async fn clock_in(
        &self,
        employee: &Employee,
        at: NaiveDateTime,
    ) -> Result<WorkSession, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO work_sessions (id, employee_id, company_id, clock_in, status, created_at, updated_at)
            SELECT ?, ?, ?, ?, 'open', ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM work_sessions
                WHERE employee_id = ? AND status IN ('open', 'pending_approval')
            )
            "#,
        )
        .bind(id)
        .bind(employee.id)
        .bind(employee.company_id)
        .bind(at)
        .bind(now)
        .bind(now)
        .bind(employee.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SessionConflict(format!(
                "employee {} already has an open or pending session",
                employee.id
            )));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::internal_server_error_message("session missing right after clock-in")
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkSession>, AppError> {
        let session = sqlx::query_as::<_, WorkSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find_by_employee(&self, employee_id: Uuid) -> Result<Vec<WorkSession>, AppError> {
        let sessions = sqlx::query_as::<_, WorkSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE employee_id = ? ORDER BY clock_in DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Start a break. Legal only while the session is open and no break is
    /// in progress; the single-open-break rule is enforced by the insert
    /// guard, not checked application-side.
    ///
    /// Break intervals must stay disjoint, so a new break may only start
    /// at or after the end of every break already recorded. That also keeps
    /// an in-progress break from ever enclosing an earlier one, no matter
    /// when it is later ended.
    pub async fn start_break(
        &self,
        session_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<SessionBreak, AppError> {
        let session = self.require_session(session_id).await?;
        if session.status != SessionStatus::Open {
            return Err(AppError::InvalidTransition(format!(
                "cannot start a break on a {} session",
                session.status
            )));
        }
        if at < session.clock_in {
            return Err(AppError::Validation(
                "break cannot start before clock-in".to_string(),
            ));
        }

        let conflicting = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM session_breaks WHERE session_id = ? AND break_end IS NOT NULL AND break_end > ?",
        )
        .bind(session_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        if conflicting > 0 {
            return Err(AppError::Validation(
                "break cannot start before an earlier break ended".to_string(),
            ));
        }

        let break_id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO session_breaks (id, session_id, break_start)
            SELECT ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM session_breaks WHERE session_id = ? AND break_end IS NULL
            )
            AND EXISTS (
                SELECT 1 FROM work_sessions WHERE id = ? AND status = 'open'
            )
            "#,
        )
        .bind(break_id)
        .bind(session_id)
        .bind(at)
        .bind(session_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidTransition(format!(
                "session {} is already on a break",
                session_id
            )));
        }

        let session_break = sqlx::query_as::<_, SessionBreak>(
            "SELECT id, session_id, break_start, break_end FROM session_breaks WHERE id = ?",
        )
        .bind(break_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session_break)
    }

    /// End the in-progress break.
    pub async fn end_break(
        &self,
        session_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<SessionBreak, AppError> {
        let session = self.require_session(session_id).await?;
        if session.status != SessionStatus::Open {
            return Err(AppError::InvalidTransition(format!(
                "cannot end a break on a {} session",
                session.status
            )));
        }

        let open_break = sqlx::query_as::<_, SessionBreak>(
            "SELECT id, session_id, break_start, break_end FROM session_breaks WHERE session_id = ? AND break_end IS NULL",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::InvalidTransition(format!("session {} is not on a break", session_id))
        })?;

        if at < open_break.break_start {
            return Err(AppError::Validation(
                "break cannot end before it started".to_string(),
            ));
        }

        let closed = sqlx::query_as::<_, SessionBreak>(
            r#"
            UPDATE session_breaks
            SET break_end = ?
            WHERE id = ? AND break_end IS NULL
            RETURNING id, session_id, break_start, break_end
            "#,
        )
        .bind(at)
        .bind(open_break.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::InvalidTransition(format!("session {} is not on a break", session_id))
        })?;

        Ok(closed)
    }

    /// Close the session: any in-progress break ends at the clock-out
    /// instant, worked time is computed net of breaks and must not be
    /// negative, and the session moves to pending approval.
    pub async fn clock_out(
        &self,
        session_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<WorkSession, AppError> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, WorkSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ?"
        ))
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        if session.status != SessionStatus::Open {
            return Err(AppError::InvalidTransition(format!(
                "cannot clock out of a {} session",
                session.status
            )));
        }
        if at <= session.clock_in {
            return Err(AppError::Validation(
                "clock-out must be after clock-in".to_string(),
            ));
        }

        // Close any in-progress break at the clock-out instant.
        sqlx::query("UPDATE session_breaks SET break_end = ? WHERE session_id = ? AND break_end IS NULL")
            .bind(at)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        let breaks = sqlx::query_as::<_, SessionBreak>(
            "SELECT id, session_id, break_start, break_end FROM session_breaks WHERE session_id = ? ORDER BY break_start ASC",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut break_minutes: i64 = 0;
        for b in &breaks {
            let end = b.break_end.unwrap_or(at);
            if b.break_start < session.clock_in || end > at || end < b.break_start {
                return Err(AppError::InvalidDuration(
                    "break falls outside the session window".to_string(),
                ));
            }
            break_minutes += (end - b.break_start).num_minutes();
        }

        let total_minutes = (at - session.clock_in).num_minutes();
        let worked_minutes = total_minutes - break_minutes;
        if worked_minutes < 0 {
            return Err(AppError::InvalidDuration(format!(
                "breaks ({} min) exceed session length ({} min)",
                break_minutes, total_minutes
            )));
        }

        let now = Utc::now().naive_utc();
        let updated = sqlx::query_as::<_, WorkSession>(&format!(
            r#"
            UPDATE work_sessions
            SET clock_out = ?, worked_minutes = ?, status = 'pending_approval', updated_at = ?
            WHERE id = ? AND status = 'open'
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(at)
        .bind(worked_minutes)
        .bind(now)
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidTransition(format!("session {} is no longer open", session_id))
        })?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Approve a pending session. Terminal for this state machine.
    pub async fn approve(&self, session_id: Uuid) -> Result<WorkSession, AppError> {
        let now = Utc::now().naive_utc();

        let updated = sqlx::query_as::<_, WorkSession>(&format!(
            r#"
            UPDATE work_sessions
            SET status = 'approved', updated_at = ?
            WHERE id = ? AND status = 'pending_approval'
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(session) => Ok(session),
            None => Err(self.transition_error(session_id, "approve").await?),
        }
    }

    /// Reject a pending session. Terminal for this state machine.
    pub async fn reject(
        &self,
        session_id: Uuid,
        reason: Option<String>,
    ) -> Result<WorkSession, AppError> {
        let now = Utc::now().naive_utc();

        let updated = sqlx::query_as::<_, WorkSession>(&format!(
            r#"
            UPDATE work_sessions
            SET status = 'rejected', rejection_reason = ?, updated_at = ?
            WHERE id = ? AND status = 'pending_approval'
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(reason)
        .bind(now)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(session) => Ok(session),
            None => Err(self.transition_error(session_id, "reject").await?),
        }
    }

    pub async fn breaks_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<SessionBreak>, AppError> {
        let breaks = sqlx::query_as::<_, SessionBreak>(
            "SELECT id, session_id, break_start, break_end FROM session_breaks WHERE session_id = ? ORDER BY break_start ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(breaks)
    }

    /// Approved sessions in the period that no payment has claimed yet.
    /// Sessions already held by any payment are excluded here rather than
    /// failing the payroll run.
    pub async fn find_unclaimed_approved(
        &self,
        employee_id: Uuid,
        period_start: NaiveDateTime,
        period_end: NaiveDateTime,
    ) -> Result<Vec<WorkSession>, AppError> {
        let sessions = sqlx::query_as::<_, WorkSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM work_sessions
            WHERE employee_id = ?
              AND status = 'approved'
              AND clock_out IS NOT NULL
              AND clock_out >= ?
              AND clock_out <= ?
              AND NOT EXISTS (
                  SELECT 1 FROM payment_sessions WHERE session_id = work_sessions.id
              )
            ORDER BY clock_in ASC
            "#
        ))
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn require_session(&self, session_id: Uuid) -> Result<WorkSession, AppError> {
        self.find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
    }

    // Distinguishes "no such session" from "wrong state" after a guarded
    // update matched nothing.
    async fn transition_error(
        &self,
        session_id: Uuid,
        action: &str,
    ) -> Result<AppError, AppError> {
        match self.find_by_id(session_id).await? {
            Some(session) => Ok(AppError::InvalidTransition(format!(
                "cannot {} a {} session",
                action, session.status
            ))),
            None => Ok(AppError::NotFound(format!(
                "Session {} not found",
                session_id
            ))),
        }
    }
}
