use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Education {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub degree: String,
    pub institution: String,
    pub year_completed: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEducation {
    pub degree: String,
    pub institution: String,
    pub year_completed: Option<String>,
}
