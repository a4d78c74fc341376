pub mod auth;
pub mod employees;
pub mod home;
pub mod json_error;
pub mod system;
pub mod uploads;
