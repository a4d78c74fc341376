use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::password::validate_password_strength;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginEmployee {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}
