use serde::{Deserialize, Serialize};

use crate::entities::employee::PublicEmployee;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicEmployee,
}

impl LoginResponse {
    pub fn new(token: String, user: PublicEmployee) -> Self {
        LoginResponse {
            message: "Login successful".to_string(),
            token,
            user,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}
