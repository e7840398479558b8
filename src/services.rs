pub mod auth;
pub mod bank_operation_service;
pub mod hr_service;
pub mod month_lines;
pub mod rbac_service;
pub mod service_payment_service;
