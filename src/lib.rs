use std::sync::Arc;

use sqlx::SqlitePool;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

pub use config::Config;
pub use error::AppError;

use database::repositories::{
    ActivityRepository, CompanyRepository, EmployeeRepository, PaymentRepository,
    SessionRepository,
};
use services::{ActivityLogger, DisbursementService, LedgerService, ProviderClient};

/// Service graph shared across workers. Repositories are cheap pool handles,
/// so every service owns its own copies.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub disbursement: DisbursementService,
    pub activity_logger: ActivityLogger,
}

impl AppState {
    pub fn build(pool: SqlitePool, provider: Arc<dyn ProviderClient>, config: &Config) -> Self {
        let companies = CompanyRepository::new(pool.clone());
        let employees = EmployeeRepository::new(pool.clone());
        let sessions = SessionRepository::new(pool.clone());
        let payments = PaymentRepository::new(pool.clone());
        let activity_logger = ActivityLogger::new(ActivityRepository::new(pool));

        let ledger = LedgerService::new(
            companies,
            employees.clone(),
            sessions,
            payments.clone(),
            activity_logger.clone(),
        );
        let disbursement = DisbursementService::new(
            payments,
            employees,
            provider,
            activity_logger.clone(),
            config,
        );

        Self {
            ledger,
            disbursement,
            activity_logger,
        }
    }
}
