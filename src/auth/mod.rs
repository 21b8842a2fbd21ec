pub mod jwt;
pub mod service_account;
