use uuid::Uuid;
use validator::Validate;

use crate::entities::credentials::{ChangePasswordRequest, LoginEmployee};
use crate::entities::employee::MessageResponse;
use crate::entities::token::LoginResponse;
use crate::errors::{AppError, AuthError};
use crate::auth::password::{hash_password, verify_password};
use crate::repositories::employee::EmployeeRepository;
use crate::repositories::token::TokenServiceRepository;

pub struct AuthHandler<R, T>
where
    R: EmployeeRepository,
    T: TokenServiceRepository,
{
    pub employee_repo: R,
    pub token_service: T,
}

impl<R, T> AuthHandler<R, T>
where
    R: EmployeeRepository,
    T: TokenServiceRepository,
{
    pub fn new(employee_repo: R, token_service: T) -> Self {
        AuthHandler {
            employee_repo,
            token_service,
        }
    }

    /// Verifies the credentials and issues a session token.
    /// Every credential failure looks the same to the caller.
    pub async fn login(&self, request: LoginEmployee) -> Result<LoginResponse, AuthError> {
        request.validate()?;

        let employee = self.employee_repo.get_employee_by_email(request.email.trim())
            .await
            .map_err(|e| {
                tracing::error!("Login lookup failed: {}", e);
                AuthError::Internal
            })?
            .ok_or(AuthError::WrongCredentials)?;

        // Legacy plaintext rows have no parsable hash and fail here too.
        let is_password_valid = verify_password(&request.password, &employee.password)
            .unwrap_or(false);
        if !is_password_valid {
            return Err(AuthError::WrongCredentials);
        }

        let token = self.token_service.create_jwt(&employee)?;

        tracing::info!("Employee {} logged in", employee.id);
        Ok(LoginResponse::new(token, employee.into()))
    }

    pub async fn change_password(
        &self,
        id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let credential = self.employee_repo.get_credential_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        let matches = verify_password(&request.old_password, &credential.password)
            .unwrap_or(false);
        if !matches {
            return Err(AppError::UnauthorizedAccess("Current password incorrect".to_string()));
        }

        request.validate()?;

        let new_hash = hash_password(&request.new_password)?;
        self.employee_repo.update_password(&id, &new_hash).await?;

        tracing::info!("Password changed for employee {}", id);
        Ok(MessageResponse::new("Password updated successfully"))
    }
}
