use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

/// Account authenticated by the `Authorization: Bearer` access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::InvalidCredentials
                    } else {
                        AppError::Forbidden
                    }
                })?;

        let claims = jwt::verify(bearer.token(), &state.config.jwt_secret)?;
        Ok(AuthUser {
            account_id: claims.account_id()?,
            email: claims.email,
        })
    }
}
