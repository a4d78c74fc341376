pub mod auth;
pub mod employees;
pub mod extractors;
