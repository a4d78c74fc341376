use futures::future::try_join_all;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, is_password_hashed};
use crate::entities::employee::{
    EmployeeCreatedResponse, EmployeeForm, EmployeeInsert, EmployeeProfile, EmployeeUpdate,
    MessageResponse,
};
use crate::errors::AppError;
use crate::repositories::employee::EmployeeRepository;
use crate::utils::uploads::PictureStore;

pub struct EmployeeHandler<R>
where
    R: EmployeeRepository,
{
    pub employee_repo: R,
    pub pictures: PictureStore,
}

impl<R> EmployeeHandler<R>
where
    R: EmployeeRepository,
{
    pub fn new(employee_repo: R, pictures: PictureStore) -> Self {
        EmployeeHandler { employee_repo, pictures }
    }

    /// Creates an account, or claims a legacy one registered under the same email.
    pub async fn create_employee(
        &self,
        form: EmployeeForm,
        picture: Option<String>,
    ) -> Result<EmployeeCreatedResponse, AppError> {
        form.validate()?;
        let password = form.required_password()?;
        let details = form.details()?;
        let records = form.child_records()?;

        let insert = EmployeeInsert {
            details,
            password_hash: hash_password(password)?,
            picture,
        };

        let saved = self.employee_repo.upsert_by_email(&insert, &records).await?;
        self.discard_replaced(saved.replaced_picture).await;

        tracing::info!("{} for employee {}", saved.outcome.message(), saved.outcome.id());
        Ok(saved.outcome.into())
    }

    /// Overwrites the profile and replaces all child collections.
    pub async fn update_employee(
        &self,
        id: Uuid,
        form: EmployeeForm,
        picture: Option<String>,
    ) -> Result<MessageResponse, AppError> {
        form.validate()?;

        let update = EmployeeUpdate {
            details: form.details()?,
            picture,
        };
        let records = form.child_records()?;

        let replaced = self.employee_repo.update_employee(&id, &update, &records).await?;
        self.discard_replaced(replaced).await;

        Ok(MessageResponse::new("Profile updated successfully"))
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<EmployeeProfile, AppError> {
        let employee = self.employee_repo
            .get_employee_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        self.employee_repo.attach_collections(employee).await
    }

    pub async fn list_employees(&self) -> Result<Vec<EmployeeProfile>, AppError> {
        let employees = self.employee_repo.list_employees().await?;

        try_join_all(
            employees
                .into_iter()
                .map(|employee| self.employee_repo.attach_collections(employee)),
        )
        .await
    }

    pub async fn delete_employee(&self, id: Uuid) -> Result<MessageResponse, AppError> {
        self.employee_repo.delete_employee(&id).await?;

        tracing::info!("Deleted employee {}", id);
        Ok(MessageResponse::new("Employee deleted successfully"))
    }

    /// Hashes every stored password that is still legacy plaintext.
    /// Returns the number of migrated accounts.
    pub async fn hash_legacy_passwords(&self) -> Result<u64, AppError> {
        let credentials = self.employee_repo.list_credentials().await?;

        let mut migrated = 0;
        for credential in credentials.iter().filter(|c| !is_password_hashed(&c.password)) {
            let hash = hash_password(&credential.password)?;
            self.employee_repo.update_password(&credential.id, &hash).await?;

            tracing::info!("Hashed password for employee {}", credential.id);
            migrated += 1;
        }

        Ok(migrated)
    }

    async fn discard_replaced(&self, replaced: Option<String>) {
        if let Some(reference) = replaced {
            self.pictures.discard(&reference).await;
        }
    }
}
