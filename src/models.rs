pub mod auth;
pub mod bank_operations;
pub mod currency;
pub mod hr;
pub mod pharmacy;
pub mod rbac;
pub mod service_payments;
