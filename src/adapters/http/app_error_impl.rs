use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Upstream(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) | AppError::WebhookAuthentication(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let status = self.status_code();
        match self {
            AppError::Database(_) => error_resp(status, ErrorCode::DatabaseError, None),
            AppError::InvalidCredentials => error_resp(
                status,
                ErrorCode::InvalidCredentials,
                Some("Access token required".into()),
            ),
            AppError::Forbidden => error_resp(status, ErrorCode::Forbidden, None),
            AppError::InvalidInput(msg) => error_resp(status, ErrorCode::InvalidInput, Some(msg)),
            // Details stay in the log; callers only learn the signature was rejected.
            AppError::WebhookAuthentication(_) => {
                error_resp(status, ErrorCode::WebhookSignatureInvalid, None)
            }
            AppError::NotFound => error_resp(status, ErrorCode::NotFound, None),
            AppError::Upstream(_) => error_resp(status, ErrorCode::UpstreamError, None),
            AppError::Internal(_) => error_resp(status, ErrorCode::InternalError, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
