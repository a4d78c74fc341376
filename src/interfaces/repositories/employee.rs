use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    entities::{
        education::Education,
        employee::{
            classify_existing, replaced_picture, ChildRecords, Employee, EmployeeInsert,
            EmployeeProfile, EmployeeUpdate, SavedEmployee, StoredCredential, UpsertAction,
            UpsertOutcome,
        },
        employment::Employment,
        training::Training,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxEmployeeRepo,
};

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, password, dob, nationality, \
    proposed_position, firm_name, picture, associations, work_countries, languages, \
    created_at, updated_at";

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;

    /// Creates the account for `employee.details.email`, or claims it when the stored
    /// password is legacy plaintext, then replaces its child collections. One transaction.
    async fn upsert_by_email(
        &self,
        employee: &EmployeeInsert,
        records: &ChildRecords,
    ) -> Result<SavedEmployee, AppError>;

    /// Overwrites the account and its child collections. One transaction.
    /// Returns the picture reference the write replaced.
    async fn update_employee(
        &self,
        id: &Uuid,
        employee: &EmployeeUpdate,
        records: &ChildRecords,
    ) -> Result<Option<String>, AppError>;

    async fn get_employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, AppError>;
    async fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>, AppError>;
    async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;

    /// Reads the three child collections and nests them under the account.
    async fn attach_collections(&self, employee: Employee) -> Result<EmployeeProfile, AppError>;

    async fn delete_employee(&self, id: &Uuid) -> Result<(), AppError>;
    async fn get_credential_by_id(&self, id: &Uuid) -> Result<Option<StoredCredential>, AppError>;
    async fn list_credentials(&self) -> Result<Vec<StoredCredential>, AppError>;
    async fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<(), AppError>;
}

impl SqlxEmployeeRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxEmployeeRepo { pool }
    }
}

#[async_trait]
impl EmployeeRepository for SqlxEmployeeRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn upsert_by_email(
        &self,
        employee: &EmployeeInsert,
        records: &ChildRecords,
    ) -> Result<SavedEmployee, AppError> {
        let details = &employee.details;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, StoredCredential>(
            "SELECT id, password FROM employees WHERE email = $1 FOR UPDATE",
        )
        .bind(&details.email)
        .fetch_optional(&mut *tx)
        .await?;

        let mut replaced = None;
        let outcome = match classify_existing(existing.as_ref()) {
            UpsertAction::Create => {
                let id = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO employees (
                        first_name, last_name, email, password, dob, nationality,
                        proposed_position, firm_name, picture, associations,
                        work_countries, languages
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    RETURNING id
                    "#,
                )
                .bind(&details.first_name)
                .bind(&details.last_name)
                .bind(&details.email)
                .bind(&employee.password_hash)
                .bind(details.dob)
                .bind(&details.nationality)
                .bind(&details.proposed_position)
                .bind(&details.firm_name)
                .bind(&employee.picture)
                .bind(&details.associations)
                .bind(&details.work_countries)
                .bind(&details.languages)
                .fetch_one(&mut *tx)
                .await?;

                UpsertOutcome::Created(id)
            }
            UpsertAction::Claim(id) => {
                tracing::info!("Legacy account {} detected, claiming it", id);

                let old_picture = current_picture(&mut *tx, id).await?.flatten();
                replaced = replaced_picture(employee.picture.as_deref(), old_picture);

                sqlx::query(
                    r#"
                    UPDATE employees SET
                        first_name = $1, last_name = $2, password = $3, dob = $4,
                        nationality = $5, proposed_position = $6, firm_name = $7,
                        picture = COALESCE($8, picture), associations = $9,
                        work_countries = $10, languages = $11, updated_at = NOW()
                    WHERE id = $12
                    "#,
                )
                .bind(&details.first_name)
                .bind(&details.last_name)
                .bind(&employee.password_hash)
                .bind(details.dob)
                .bind(&details.nationality)
                .bind(&details.proposed_position)
                .bind(&details.firm_name)
                .bind(&employee.picture)
                .bind(&details.associations)
                .bind(&details.work_countries)
                .bind(&details.languages)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                UpsertOutcome::Claimed(id)
            }
            UpsertAction::Reject => {
                // Dropping the transaction rolls it back.
                return Err(AppError::Conflict(
                    "An account with this email already exists.".to_string(),
                ));
            }
        };

        replace_child_records(&mut *tx, outcome.id(), records).await?;
        tx.commit().await?;

        Ok(SavedEmployee {
            outcome,
            replaced_picture: replaced,
        })
    }

    async fn update_employee(
        &self,
        id: &Uuid,
        employee: &EmployeeUpdate,
        records: &ChildRecords,
    ) -> Result<Option<String>, AppError> {
        let details = &employee.details;
        let mut tx = self.pool.begin().await?;

        let old_picture = current_picture(&mut *tx, *id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        sqlx::query(
            r#"
            UPDATE employees SET
                first_name = $1, last_name = $2, email = $3, dob = $4,
                nationality = $5, proposed_position = $6, firm_name = $7,
                picture = COALESCE($8, picture), associations = $9,
                work_countries = $10, languages = $11, updated_at = NOW()
            WHERE id = $12
            "#,
        )
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.email)
        .bind(details.dob)
        .bind(&details.nationality)
        .bind(&details.proposed_position)
        .bind(&details.firm_name)
        .bind(&employee.picture)
        .bind(&details.associations)
        .bind(&details.work_countries)
        .bind(&details.languages)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        replace_child_records(&mut *tx, *id, records).await?;
        tx.commit().await?;

        Ok(replaced_picture(employee.picture.as_deref(), old_picture))
    }

    async fn get_employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn attach_collections(&self, employee: Employee) -> Result<EmployeeProfile, AppError> {
        let id = employee.id;

        let (education, trainings, employment_history) = futures::try_join!(
            sqlx::query_as::<_, Education>(
                "SELECT id, employee_id, degree, institution, year_completed \
                 FROM education WHERE employee_id = $1 ORDER BY position"
            )
            .bind(id)
            .fetch_all(&self.pool),
            sqlx::query_as::<_, Training>(
                "SELECT id, employee_id, certification_name \
                 FROM trainings WHERE employee_id = $1 ORDER BY position"
            )
            .bind(id)
            .fetch_all(&self.pool),
            sqlx::query_as::<_, Employment>(
                "SELECT id, employee_id, employer, position_held, start_date, end_date \
                 FROM employment_history WHERE employee_id = $1 ORDER BY position"
            )
            .bind(id)
            .fetch_all(&self.pool),
        )?;

        Ok(EmployeeProfile {
            employee: employee.into(),
            education,
            trainings,
            employment_history,
        })
    }

    async fn delete_employee(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        Ok(())
    }

    async fn get_credential_by_id(&self, id: &Uuid) -> Result<Option<StoredCredential>, AppError> {
        sqlx::query_as::<_, StoredCredential>("SELECT id, password FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn list_credentials(&self) -> Result<Vec<StoredCredential>, AppError> {
        sqlx::query_as::<_, StoredCredential>("SELECT id, password FROM employees ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE employees SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        Ok(())
    }
}

/// Locks the account row and reads its picture. `None` when the account does not exist.
async fn current_picture(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Option<String>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>("SELECT picture FROM employees WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Deletes every child row of the account and inserts the given sets in order.
async fn replace_child_records(
    conn: &mut PgConnection,
    employee_id: Uuid,
    records: &ChildRecords,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM education WHERE employee_id = $1")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM trainings WHERE employee_id = $1")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM employment_history WHERE employee_id = $1")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;

    for (position, entry) in records.education.iter().enumerate() {
        sqlx::query(
            "INSERT INTO education (employee_id, position, degree, institution, year_completed) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(employee_id)
        .bind(position as i32)
        .bind(&entry.degree)
        .bind(&entry.institution)
        .bind(&entry.year_completed)
        .execute(&mut *conn)
        .await?;
    }

    for (position, entry) in records.trainings.iter().enumerate() {
        sqlx::query(
            "INSERT INTO trainings (employee_id, position, certification_name) VALUES ($1, $2, $3)",
        )
        .bind(employee_id)
        .bind(position as i32)
        .bind(&entry.certification_name)
        .execute(&mut *conn)
        .await?;
    }

    for (position, entry) in records.employment_history.iter().enumerate() {
        sqlx::query(
            "INSERT INTO employment_history \
             (employee_id, position, employer, position_held, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(employee_id)
        .bind(position as i32)
        .bind(&entry.employer)
        .bind(&entry.position_held)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mockall::mock! {
    pub EmployeeRepo {}

    #[async_trait]
    impl EmployeeRepository for EmployeeRepo {
        async fn check_connection(&self) -> Result<(), AppError>;
        async fn upsert_by_email(&self, employee: &EmployeeInsert, records: &ChildRecords) -> Result<SavedEmployee, AppError>;
        async fn update_employee(&self, id: &Uuid, employee: &EmployeeUpdate, records: &ChildRecords) -> Result<Option<String>, AppError>;
        async fn get_employee_by_id(&self, id: &Uuid) -> Result<Option<Employee>, AppError>;
        async fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>, AppError>;
        async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;
        async fn attach_collections(&self, employee: Employee) -> Result<EmployeeProfile, AppError>;
        async fn delete_employee(&self, id: &Uuid) -> Result<(), AppError>;
        async fn get_credential_by_id(&self, id: &Uuid) -> Result<Option<StoredCredential>, AppError>;
        async fn list_credentials(&self) -> Result<Vec<StoredCredential>, AppError>;
        async fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<(), AppError>;
    }
}
