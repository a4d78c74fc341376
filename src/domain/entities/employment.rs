use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of an employee's employment history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employer: String,
    pub position_held: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployment {
    pub employer: String,
    pub position_held: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
