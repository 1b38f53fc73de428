use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, auth::AuthUser},
    app_error::AppResult,
    application::{jwt, use_cases::account::ProfileUpdate},
    domain::entities::account::Account,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/me", get(get_me))
        .route("/{id}", get(get_account).put(update_account))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    email: Option<String>,
    display_name: Option<String>,
    #[serde(rename = "photoURL")]
    photo_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    user: Account,
    access_token: String,
}

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let account = app_state
        .account_use_cases
        .register(
            payload.email.as_deref(),
            payload.display_name.as_deref(),
            payload.photo_url.as_deref(),
        )
        .await?;

    let access_token = jwt::issue(
        account.id,
        &account.email,
        &app_state.config.jwt_secret,
        app_state.config.access_token_ttl,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: account,
            access_token,
        }),
    ))
}

async fn get_me(State(app_state): State<AppState>, user: AuthUser) -> AppResult<Json<Account>> {
    let account = app_state.account_use_cases.get(user.account_id).await?;
    Ok(Json(account))
}

async fn get_account(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Account>> {
    let account = app_state.account_use_cases.get(id).await?;
    Ok(Json(account))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    display_name: Option<String>,
    #[serde(rename = "photoURL")]
    photo_url: Option<String>,
}

async fn update_account(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePayload>,
) -> AppResult<Json<Account>> {
    let account = app_state
        .account_use_cases
        .update_profile(
            user.account_id,
            id,
            ProfileUpdate {
                display_name: payload.display_name,
                photo_url: payload.photo_url,
            },
        )
        .await?;
    Ok(Json(account))
}
