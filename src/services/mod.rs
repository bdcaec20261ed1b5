pub mod activity_logger;
pub mod disbursement;
pub mod ledger;
pub mod payroll;
pub mod provider;

pub use activity_logger::ActivityLogger;
pub use disbursement::{CallbackResult, DisbursementService};
pub use ledger::LedgerService;
pub use provider::{HttpProviderClient, ProviderClient, ProviderError, TransferAck, TransferRequest};
