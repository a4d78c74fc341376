use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxEmployeeRepo {
    pub pool: PgPool,
}
