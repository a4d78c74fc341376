use actix_web::web;

use crate::handlers::{home::home, json_error::route_not_found, system::health_check};

mod employees;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.service(
        web::scope("/api")
            .configure(employees::config_routes)
    );

    cfg.configure(employees::config_uploads);
    json_error::config_routes(cfg, upload_limit);
    cfg.default_service(web::route().to(route_not_found));
}
