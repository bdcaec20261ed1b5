use actix_web::{web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{SessionBreak, WorkSession};
use crate::database::repositories::{EmployeeRepository, SessionRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInRequest {
    pub employee_id: Uuid,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampRequest {
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectSessionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    pub employee_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: WorkSession,
    pub breaks: Vec<SessionBreak>,
}

fn effective_timestamp(requested: Option<NaiveDateTime>) -> NaiveDateTime {
    requested.unwrap_or_else(|| Utc::now().naive_utc())
}

/// Open a work session for an active employee
pub async fn clock_in(
    input: web::Json<ClockInRequest>,
    sessions: web::Data<SessionRepository>,
    employees: web::Data<EmployeeRepository>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let employee = employees
        .find_by_id(input.employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", input.employee_id)))?;

    if !employee.is_active {
        return Err(AppError::Validation(format!(
            "employee {} is not active",
            employee.id
        )));
    }

    let at = effective_timestamp(input.timestamp);
    let session = sessions.clock_in(&employee, at).await?;

    if let Err(e) = state
        .activity_logger
        .log_session_activity(
            session.company_id,
            session.id,
            "clock_in",
            format!("Employee {} clocked in", employee.id),
            None,
        )
        .await
    {
        log::warn!("Failed to log clock-in activity: {}", e);
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(session)))
}

/// Get a session with its breaks
pub async fn get_session(
    path: web::Path<Uuid>,
    sessions: web::Data<SessionRepository>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();

    let session = sessions
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
    let breaks = sessions.breaks_for_session(session_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionDetail { session, breaks })))
}

/// List an employee's sessions, newest first
pub async fn get_sessions(
    query: web::Query<SessionsQuery>,
    sessions: web::Data<SessionRepository>,
) -> Result<HttpResponse, AppError> {
    let found = sessions.find_by_employee(query.employee_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(found)))
}

/// Start a break on an open session
pub async fn start_break(
    path: web::Path<Uuid>,
    input: web::Json<TimestampRequest>,
    sessions: web::Data<SessionRepository>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let at = effective_timestamp(input.timestamp);

    let session_break = sessions.start_break(session_id, at).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(session_break)))
}

/// End the in-progress break
pub async fn end_break(
    path: web::Path<Uuid>,
    input: web::Json<TimestampRequest>,
    sessions: web::Data<SessionRepository>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let at = effective_timestamp(input.timestamp);

    let session_break = sessions.end_break(session_id, at).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(session_break)))
}

/// Close a session and submit it for approval
pub async fn clock_out(
    path: web::Path<Uuid>,
    input: web::Json<TimestampRequest>,
    sessions: web::Data<SessionRepository>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let at = effective_timestamp(input.timestamp);

    let session = sessions.clock_out(session_id, at).await?;

    let metadata = crate::services::ActivityLogger::metadata(vec![(
        "worked_minutes",
        session.worked_minutes.unwrap_or(0).to_string(),
    )]);
    if let Err(e) = state
        .activity_logger
        .log_session_activity(
            session.company_id,
            session.id,
            "clock_out",
            format!("Employee {} clocked out", session.employee_id),
            Some(metadata),
        )
        .await
    {
        log::warn!("Failed to log clock-out activity: {}", e);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(session)))
}

/// Approve a pending session, making it payable
pub async fn approve_session(
    path: web::Path<Uuid>,
    sessions: web::Data<SessionRepository>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let session = sessions.approve(session_id).await?;

    if let Err(e) = state
        .activity_logger
        .log_session_activity(
            session.company_id,
            session.id,
            "approved",
            "Session approved".to_string(),
            None,
        )
        .await
    {
        log::warn!("Failed to log session approval activity: {}", e);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(session)))
}

/// Reject a pending session
pub async fn reject_session(
    path: web::Path<Uuid>,
    input: web::Json<RejectSessionRequest>,
    sessions: web::Data<SessionRepository>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let session = sessions.reject(session_id, input.reason.clone()).await?;

    if let Err(e) = state
        .activity_logger
        .log_session_activity(
            session.company_id,
            session.id,
            "rejected",
            format!(
                "Session rejected{}",
                session
                    .rejection_reason
                    .as_deref()
                    .map(|r| format!(": {}", r))
                    .unwrap_or_default()
            ),
            None,
        )
        .await
    {
        log::warn!("Failed to log session rejection activity: {}", e);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(session)))
}
