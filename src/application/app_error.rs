use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Webhook authentication failed: {0}")]
    WebhookAuthentication(String),

    #[error("Not found")]
    NotFound,

    #[error("Payment provider error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the provider should redeliver a webhook that failed with this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Upstream(_) | AppError::Internal(_)
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    Forbidden,
    InvalidInput,
    WebhookSignatureInvalid,
    NotFound,
    UpstreamError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::WebhookSignatureInvalid => "WEBHOOK_SIGNATURE_INVALID",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
