use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

/// Access token claims. `sub` is the account id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn account_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Forbidden)
    }
}

pub fn issue(account_id: Uuid, email: &str, secret: &SecretString, ttl: Duration) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let exp = now + ttl.whole_seconds();
    let claims = Claims {
        sub: account_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp,
    };
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Invalid, tampered and expired tokens all map to `Forbidden`.
pub fn verify(token: &str, secret: &SecretString) -> AppResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AppError::Forbidden
    })
}
