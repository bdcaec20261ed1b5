use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::repositories::PaymentRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPayrollRequest {
    pub company_id: Uuid,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsQuery {
    pub company_id: Uuid,
}

/// Run payroll for a period, creating pending payments from approved
/// sessions that no earlier payment has claimed
pub async fn run_payroll(
    input: web::Json<RunPayrollRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let payments = state
        .ledger
        .run_payroll(
            input.company_id,
            input.period_start,
            input.period_end,
            input.employee_id,
        )
        .await?;

    if payments.is_empty() {
        return Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            Some(payments),
            "No eligible sessions in the period",
        )));
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(payments)))
}

pub async fn get_payment(
    path: web::Path<Uuid>,
    payments: web::Data<PaymentRepository>,
) -> Result<HttpResponse, AppError> {
    let payment_id = path.into_inner();

    let payment = payments
        .find_by_id(payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(payment)))
}

pub async fn get_payments(
    query: web::Query<PaymentsQuery>,
    payments: web::Data<PaymentRepository>,
) -> Result<HttpResponse, AppError> {
    let found = payments.find_by_company(query.company_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(found)))
}

/// Approve a pending payment and kick off disbursement in the background.
/// The response carries the approved payment; its processing/terminal state
/// arrives through subsequent reads and the provider webhook.
pub async fn approve_payment(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let payment_id = path.into_inner();
    let payment = state.disbursement.approve(payment_id).await?;

    let disbursement = state.disbursement.clone();
    tokio::spawn(async move {
        if let Err(e) = disbursement.disburse(payment_id).await {
            log::error!("background disbursement of payment {} failed: {}", payment_id, e);
        }
    });

    Ok(HttpResponse::Ok().json(ApiResponse::success(payment)))
}

/// Cancel a payment that has not reached the provider yet. Its sessions
/// remain claimed.
pub async fn cancel_payment(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let payment_id = path.into_inner();
    let payment = state.disbursement.cancel(payment_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(payment)))
}
