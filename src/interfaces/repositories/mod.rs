pub mod employee;
pub mod sqlx_repo;
pub mod token;
