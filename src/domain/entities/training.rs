use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Training {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub certification_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTraining {
    pub certification_name: String,
}
