use actix_web::{get, web, HttpResponse, Responder};

use crate::errors::AppError;
use crate::AppState;

#[get("/{file_name}")]
pub async fn serve_picture(
    state: web::Data<AppState>,
    file_name: web::Path<String>,
) -> impl Responder {
    match state.employee_handler.pictures.open(&file_name).await {
        Ok((bytes, mime)) => HttpResponse::Ok().content_type(mime).body(bytes),
        Err(e) => AppError::from(e).to_http_response(),
    }
}
