use actix_web::web;

use crate::handlers::{auth, employees, uploads};
use crate::utils::uploads::PUBLIC_PREFIX;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            .service(auth::login)
            .service(auth::change_password)
            .service(employees::create_employee)
            .service(employees::list_employees)
            .service(employees::get_employee)
            .service(employees::update_employee)
            .service(employees::delete_employee)
    );
}

pub fn config_uploads(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(&format!("/{}", PUBLIC_PREFIX))
            .service(uploads::serve_picture)
    );
}
