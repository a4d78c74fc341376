pub mod credentials;
pub mod education;
pub mod employee;
pub mod employment;
pub mod token;
pub mod training;
