mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, password, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, utils};

use auth::jwt::JwtService;
use repositories::sqlx_repo::SqlxEmployeeRepo;
use use_cases::{auth::AuthHandler, employees::EmployeeHandler};
use utils::uploads::PictureStore;

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub employee_handler: AppEmployeeHandler,
}

pub type AppAuthHandler = AuthHandler<SqlxEmployeeRepo, JwtService>;
pub type AppEmployeeHandler = EmployeeHandler<SqlxEmployeeRepo>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let jwt_service = JwtService::new(config);
        let employee_repo = SqlxEmployeeRepo::new(pool);

        AppState {
            auth_handler: AuthHandler::new(employee_repo.clone(), jwt_service),
            employee_handler: EmployeeHandler::new(
                employee_repo,
                PictureStore::new(&config.upload_dir, config.max_upload_bytes()),
            ),
        }
    }
}
