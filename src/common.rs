pub mod error;
pub mod extract;
pub mod uploads;
pub mod validation;
