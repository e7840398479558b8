pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod caja_repo;
pub use caja_repo::CajaRepository;
pub mod bank_operations_repo;
pub use bank_operations_repo::BankOperationsRepository;
pub mod pharmacy_repo;
pub use pharmacy_repo::PharmacyRepository;
pub mod service_payments_repo;
pub use service_payments_repo::ServicePaymentsRepository;
pub mod hr_repo;
pub use hr_repo::HrRepository;
