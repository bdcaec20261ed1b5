pub mod activity;
pub mod company;
pub mod employee;
pub mod payment;
pub mod session;

// Re-export all repositories for easy importing
pub use activity::ActivityRepository;
pub use company::CompanyRepository;
pub use employee::EmployeeRepository;
pub use payment::PaymentRepository;
pub use session::SessionRepository;
