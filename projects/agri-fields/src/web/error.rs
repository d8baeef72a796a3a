use crate::field::error::FieldError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Boundary error: every failure leaves the API as
/// `{"success": false, "message": ...}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub FieldError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            FieldError::Validation(_) => StatusCode::BAD_REQUEST,
            FieldError::NotFound(_) => StatusCode::NOT_FOUND,
            FieldError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(FieldError::validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = Json(json!({
            "success": false,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
