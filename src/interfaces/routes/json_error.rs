use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::JsonPayloadError,
};
use serde_json::json;

/// Room for the text parts of a profile form on top of the picture itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn config_routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        JsonError::from(err).into()
    }));

    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(upload_limit + FORM_OVERHEAD_BYTES)
            .error_handler(|err, _req| JsonError::from(err).into()),
    );
}

#[derive(Debug)]
pub struct JsonError {
    message: String,
    status: StatusCode
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        JsonError {
            message: format!("JSON payload error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<MultipartError> for JsonError {
    fn from(err: MultipartError) -> Self {
        let status = match &err {
            MultipartError::Payload(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        JsonError {
            message: format!("Multipart form error: {}", err),
            status,
        }
    }
}
