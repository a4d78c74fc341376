use actix_web::{post, put, web, HttpResponse, Responder, ResponseError};

use crate::entities::credentials::{ChangePasswordRequest, LoginEmployee};
use crate::use_cases::extractors::AuthClaims;
use crate::utils::valid_uuid::valid_uuid;
use crate::AppState;

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<LoginEmployee>,
) -> impl Responder {
    match state.auth_handler.login(credentials.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

#[put("/{id}/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    id: web::Path<String>,
    claims: AuthClaims,
    request: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    let id = match valid_uuid(&id).and_then(|id| claims.ensure_owner(&id).map(|_| id)) {
        Ok(id) => id,
        Err(e) => return e.to_http_response(),
    };

    match state.auth_handler.change_password(id, request.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}
