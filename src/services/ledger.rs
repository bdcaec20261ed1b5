use chrono::NaiveDateTime;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::database::models::{Company, Employee, Payment, PaymentDraft};
use crate::database::repositories::{
    CompanyRepository, EmployeeRepository, PaymentRepository, SessionRepository,
};
use crate::error::AppError;
use crate::services::activity_logger::ActivityLogger;
use crate::services::payroll::{self, RateCard};

/// How many times a payroll run re-reads eligibility after losing the
/// reservation race before giving up.
const MAX_RESERVE_ATTEMPTS: usize = 3;

/// Converts approved sessions into payments, enforcing that every session
/// is compensated at most once. The only writer of the session reverse
/// index.
#[derive(Clone)]
pub struct LedgerService {
    companies: CompanyRepository,
    employees: EmployeeRepository,
    sessions: SessionRepository,
    payments: PaymentRepository,
    activity: ActivityLogger,
}

impl LedgerService {
    pub fn new(
        companies: CompanyRepository,
        employees: EmployeeRepository,
        sessions: SessionRepository,
        payments: PaymentRepository,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            companies,
            employees,
            sessions,
            payments,
            activity,
        }
    }

    /// Run payroll over a period for one employee or the whole company.
    /// Employees with no eligible sessions simply produce no payment; an
    /// empty result means "nothing to pay", not an error.
    pub async fn run_payroll(
        &self,
        company_id: Uuid,
        period_start: NaiveDateTime,
        period_end: NaiveDateTime,
        employee_id: Option<Uuid>,
    ) -> Result<Vec<Payment>, AppError> {
        if period_end <= period_start {
            return Err(AppError::Validation(
                "period end must be after period start".to_string(),
            ));
        }

        let company = self
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {} not found", company_id)))?;

        let timezone: Tz = company.timezone.parse().map_err(|_| {
            AppError::Validation(format!("invalid company timezone: {}", company.timezone))
        })?;

        let employees = match employee_id {
            Some(id) => {
                let employee = self
                    .employees
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))?;
                if employee.company_id != company_id {
                    return Err(AppError::Validation(format!(
                        "employee {} does not belong to company {}",
                        id, company_id
                    )));
                }
                vec![employee]
            }
            None => self.employees.find_active_by_company(company_id).await?,
        };

        let mut created = Vec::new();
        for employee in &employees {
            if let Some(payment) = self
                .pay_employee(&company, employee, period_start, period_end, timezone)
                .await?
            {
                created.push(payment);
            }
        }

        Ok(created)
    }

    /// Select eligible sessions, compute the breakdown from a rate snapshot
    /// and atomically reserve the sessions. A lost reservation race
    /// re-reads eligibility from scratch: the sessions we saw may now
    /// belong to the other run's payment.
    async fn pay_employee(
        &self,
        company: &Company,
        employee: &Employee,
        period_start: NaiveDateTime,
        period_end: NaiveDateTime,
        timezone: Tz,
    ) -> Result<Option<Payment>, AppError> {
        for attempt in 1..=MAX_RESERVE_ATTEMPTS {
            let sessions = self
                .sessions
                .find_unclaimed_approved(employee.id, period_start, period_end)
                .await?;
            if sessions.is_empty() {
                return Ok(None);
            }

            let role = self
                .companies
                .find_job_role(employee.job_role_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Job role {} not found", employee.job_role_id))
                })?;

            let rates = RateCard::from(&role);
            let breakdown = payroll::compute(
                &sessions,
                &rates,
                company.max_daily_hours,
                role.bonus_hours,
                company.bonus_rate_multiplier,
                timezone,
            );

            let draft = PaymentDraft {
                employee_id: employee.id,
                company_id: company.id,
                period_start,
                period_end,
                regular_hours: breakdown.regular_hours,
                overtime_hours: breakdown.overtime_hours,
                bonus_hours: breakdown.bonus_hours,
                amount: breakdown.amount,
            };
            let session_ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();

            match self.payments.reserve_and_create(&draft, &session_ids).await? {
                Some(payment) => {
                    let metadata = ActivityLogger::metadata(vec![
                        ("session_count", session_ids.len().to_string()),
                        ("amount", payment.amount.to_string()),
                    ]);
                    if let Err(e) = self
                        .activity
                        .log_payment_activity(
                            company.id,
                            payment.id,
                            "created",
                            format!("Payment created for employee {}", employee.id),
                            Some(metadata),
                        )
                        .await
                    {
                        log::warn!("Failed to log payment creation activity: {}", e);
                    }
                    return Ok(Some(payment));
                }
                None => {
                    log::info!(
                        "payroll reservation for employee {} lost the race (attempt {}/{}), re-reading eligibility",
                        employee.id,
                        attempt,
                        MAX_RESERVE_ATTEMPTS
                    );
                }
            }
        }

        Err(AppError::ConcurrencyConflict(format!(
            "could not reserve sessions for employee {} after {} attempts",
            employee.id, MAX_RESERVE_ATTEMPTS
        )))
    }
}
