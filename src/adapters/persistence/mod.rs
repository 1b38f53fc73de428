use sqlx::PgPool;

use crate::app_error::AppError;

pub mod account;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL unique violation
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::InvalidInput("User already exists".into())
                }
                // PostgreSQL not-null violation
                else if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidInput("Required field is missing".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
