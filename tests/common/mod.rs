#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::SqlitePool;
use uuid::Uuid;

use paylinkr_be::database::models::{
    Company, CompanyInput, Employee, EmployeeInput, JobRole, JobRoleInput, PaymentCycle,
    WorkSession,
};
use paylinkr_be::database::repositories::{
    CompanyRepository, EmployeeRepository, PaymentRepository, SessionRepository,
};
use paylinkr_be::handlers;
use paylinkr_be::services::{ProviderClient, ProviderError, TransferAck, TransferRequest};
use paylinkr_be::{AppState, Config};

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        provider_base_url: "http://127.0.0.1:0".to_string(),
        provider_api_key: "test-api-key".to_string(),
        provider_webhook_secret: "test-webhook-secret".to_string(),
        provider_timeout_secs: 1,
        max_disbursement_attempts: 3,
        // keep retry tests fast
        disbursement_backoff_ms: 2,
    }
}

/// Scripted stand-in for the mobile-money provider. Outcomes are consumed
/// in order; once the script runs out every further call acks.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Ack(String),
    Timeout(String),
    Reject(String),
}

#[derive(Default)]
pub struct MockProvider {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<TransferRequest>>,
    executed: Mutex<HashSet<Uuid>>,
}

impl MockProvider {
    pub fn always_ack() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_outcomes(outcomes: Vec<MockOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        })
    }

    /// How many transfer requests reached the provider, retries included.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// How many distinct idempotency keys actually moved money.
    pub fn executed_transfer_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn request_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferAck, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Ack(format!("tx-{}", Uuid::new_v4())));

        match outcome {
            MockOutcome::Ack(transaction_id) => {
                self.executed.lock().unwrap().insert(request.idempotency_key);
                Ok(TransferAck { transaction_id })
            }
            MockOutcome::Timeout(reason) => Err(ProviderError::Transient(reason)),
            MockOutcome::Reject(reason) => Err(ProviderError::Terminal(reason)),
        }
    }
}

pub fn build_state(pool: &SqlitePool, provider: Arc<MockProvider>) -> AppState {
    AppState::build(pool.clone(), provider, &test_config())
}

pub fn create_app(
    pool: &SqlitePool,
    provider: Arc<MockProvider>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let config = test_config();
    let state = AppState::build(pool.clone(), provider, &config);

    App::new()
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(SessionRepository::new(pool.clone())))
        .app_data(web::Data::new(EmployeeRepository::new(pool.clone())))
        .app_data(web::Data::new(PaymentRepository::new(pool.clone())))
        .configure(handlers::configure)
}

pub struct TestOrg {
    pub company: Company,
    pub role: JobRole,
    pub employee: Employee,
}

/// UTC company with an 8h daily overtime threshold, 50/hr base, 75/hr
/// overtime and no bonus.
pub async fn seed_default(pool: &SqlitePool) -> TestOrg {
    seed_org(pool, "UTC", 8.0, 1.0, "50", "75", "0", 0.0).await
}

pub async fn seed_org(
    pool: &SqlitePool,
    timezone: &str,
    max_daily_hours: f64,
    bonus_rate_multiplier: f64,
    base_rate: &str,
    overtime_rate: &str,
    bonus_rate: &str,
    bonus_hours: f64,
) -> TestOrg {
    let companies = CompanyRepository::new(pool.clone());
    let employees = EmployeeRepository::new(pool.clone());

    let company = companies
        .create_company(CompanyInput {
            name: CompanyName().fake(),
            payment_cycle: PaymentCycle::Monthly,
            max_daily_hours,
            bonus_rate_multiplier,
            timezone: timezone.to_string(),
        })
        .await
        .unwrap();

    let role = companies
        .create_job_role(JobRoleInput {
            company_id: company.id,
            name: "Field Agent".to_string(),
            base_rate: base_rate.parse().unwrap(),
            overtime_rate: overtime_rate.parse().unwrap(),
            bonus_rate: bonus_rate.parse().unwrap(),
            bonus_hours,
        })
        .await
        .unwrap();

    let employee = seed_employee(pool, &company, &role).await;

    TestOrg {
        company,
        role,
        employee,
    }
}

pub async fn seed_employee(pool: &SqlitePool, company: &Company, role: &JobRole) -> Employee {
    let employees = EmployeeRepository::new(pool.clone());
    employees
        .create_employee(EmployeeInput {
            company_id: company.id,
            job_role_id: role.id,
            name: Name().fake(),
            wallet_number: format!("+2557{:08}", (10000000..99999999).fake::<u32>()),
        })
        .await
        .unwrap()
}

/// Clock in, clock out, approve.
pub async fn approved_session(
    pool: &SqlitePool,
    employee: &Employee,
    clock_in: NaiveDateTime,
    clock_out: NaiveDateTime,
) -> WorkSession {
    let sessions = SessionRepository::new(pool.clone());
    let session = sessions.clock_in(employee, clock_in).await.unwrap();
    sessions.clock_out(session.id, clock_out).await.unwrap();
    sessions.approve(session.id).await.unwrap()
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn payments_repo(pool: &SqlitePool) -> PaymentRepository {
    PaymentRepository::new(pool.clone())
}

pub fn sessions_repo(pool: &SqlitePool) -> SessionRepository {
    SessionRepository::new(pool.clone())
}
