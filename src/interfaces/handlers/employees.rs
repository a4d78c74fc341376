use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::entities::employee::EmployeeUpload;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::utils::{uploads::PictureStore, valid_uuid::valid_uuid};
use crate::AppState;

#[post("")]
pub async fn create_employee(
    state: web::Data<AppState>,
    MultipartForm(upload): MultipartForm<EmployeeUpload>,
) -> impl Responder {
    let (form, picture) = match upload.into_form() {
        Ok(parts) => parts,
        Err(e) => return e.to_http_response(),
    };

    let picture = match store_picture(&state.employee_handler.pictures, picture).await {
        Ok(reference) => reference,
        Err(e) => return e.to_http_response(),
    };

    match state.employee_handler.create_employee(form, picture.clone()).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => {
            discard_picture(&state.employee_handler.pictures, picture.as_deref()).await;
            e.to_http_response()
        }
    }
}

#[get("")]
pub async fn list_employees(state: web::Data<AppState>) -> impl Responder {
    match state.employee_handler.list_employees().await {
        Ok(profiles) => HttpResponse::Ok().json(profiles),
        Err(e) => e.to_http_response(),
    }
}

#[get("/{id}")]
pub async fn get_employee(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    let id = match valid_uuid(&id) {
        Ok(id) => id,
        Err(e) => return e.to_http_response(),
    };

    match state.employee_handler.get_employee(id).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => e.to_http_response(),
    }
}

#[put("/{id}")]
pub async fn update_employee(
    state: web::Data<AppState>,
    id: web::Path<String>,
    claims: AuthClaims,
    MultipartForm(upload): MultipartForm<EmployeeUpload>,
) -> impl Responder {
    let id = match valid_uuid(&id).and_then(|id| claims.ensure_owner(&id).map(|_| id)) {
        Ok(id) => id,
        Err(e) => return e.to_http_response(),
    };

    let (form, picture) = match upload.into_form() {
        Ok(parts) => parts,
        Err(e) => return e.to_http_response(),
    };

    let picture = match store_picture(&state.employee_handler.pictures, picture).await {
        Ok(reference) => reference,
        Err(e) => return e.to_http_response(),
    };

    match state.employee_handler.update_employee(id, form, picture.clone()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            discard_picture(&state.employee_handler.pictures, picture.as_deref()).await;
            e.to_http_response()
        }
    }
}

#[delete("/{id}")]
pub async fn delete_employee(
    state: web::Data<AppState>,
    id: web::Path<String>,
    claims: AuthClaims,
) -> impl Responder {
    let id = match valid_uuid(&id).and_then(|id| claims.ensure_owner(&id).map(|_| id)) {
        Ok(id) => id,
        Err(e) => return e.to_http_response(),
    };

    match state.employee_handler.delete_employee(id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

async fn store_picture(
    store: &PictureStore,
    picture: Option<TempFile>,
) -> Result<Option<String>, AppError> {
    match picture {
        Some(file) => Ok(Some(store.save(file.file.path()).await?)),
        None => Ok(None),
    }
}

async fn discard_picture(store: &PictureStore, reference: Option<&str>) {
    if let Some(reference) = reference {
        store.discard(reference).await;
    }
}
