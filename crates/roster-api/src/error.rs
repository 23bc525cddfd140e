use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roster_db::StoreError;
use roster_types::api::ErrorResponse;
use tracing::error;

/// A status code plus the message sent back as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::AccountExists(_) => StatusCode::CONFLICT,
            StoreError::UnknownAccount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => {
                error!("Storage failure: {}", e);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
