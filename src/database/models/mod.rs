pub(crate) mod macros;

pub mod activity;
pub mod company;
pub mod employee;
pub mod money;
pub mod payment;
pub mod session;

pub use activity::{ActivityEntry, CreateActivityInput, EntityType};
pub use company::{Company, CompanyInput, PaymentCycle};
pub use employee::{Employee, EmployeeInput, JobRole, JobRoleInput};
pub use money::Money;
pub use payment::{Payment, PaymentClaim, PaymentDraft, PaymentStatus};
pub use session::{SessionBreak, SessionStatus, WorkSession};
