//! Checkout, verification poll and provider webhook routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, auth::AuthUser},
    app_error::{AppError, AppResult},
    application::use_cases::payment_reconciler::{
        PaymentVerification, ReconcileOutcome, WebhookOutcome,
    },
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/verify-payment", post(verify_payment))
        .route("/webhook", post(webhook))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCheckoutPayload {
    email: Option<String>,
    #[serde(alias = "userId")]
    account_id: Option<String>,
}

async fn create_checkout_session(
    State(app_state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateCheckoutPayload>,
) -> AppResult<impl IntoResponse> {
    let checkout = app_state
        .checkout_use_cases
        .initiate(payload.account_id.as_deref(), payload.email.as_deref())
        .await?;
    Ok(Json(checkout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPaymentPayload {
    session_id: Option<String>,
}

/// The client polls this after the checkout redirect. Responses use the
/// `{success, ...}` envelope instead of the error-code body.
async fn verify_payment(
    State(app_state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<VerifyPaymentPayload>,
) -> Response {
    match app_state
        .reconciler
        .verify_session(payload.session_id.as_deref())
        .await
    {
        Ok(verification) => verification_response(verification),
        Err(AppError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "User not found" })),
        )
            .into_response(),
        Err(AppError::InvalidInput(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": msg })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = ?err, "Payment verification failed");
            (
                err.status_code(),
                Json(json!({ "success": false, "error": "Payment verification failed" })),
            )
                .into_response()
        }
    }
}

fn verification_response(verification: PaymentVerification) -> Response {
    let PaymentVerification {
        outcome,
        payment_status,
        intent_status,
    } = verification;

    let rejected = |error: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": error,
                "status": payment_status,
                "intentStatus": intent_status,
            })),
        )
            .into_response()
    };

    match outcome {
        ReconcileOutcome::Granted(account) => {
            (StatusCode::OK, Json(json!({ "success": true, "user": account }))).into_response()
        }
        ReconcileOutcome::Pending => (
            StatusCode::ACCEPTED,
            Json(json!({
                "success": false,
                "pending": true,
                "status": payment_status,
                "intentStatus": intent_status,
            })),
        )
            .into_response(),
        ReconcileOutcome::Denied(_) | ReconcileOutcome::StaleDenial => {
            rejected("Payment was not completed")
        }
        ReconcileOutcome::Withheld => rejected("Payment status could not be confirmed"),
    }
}

/// Provider webhook. The body is verified byte-for-byte before parsing.
async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::WebhookAuthentication("Missing Stripe-Signature header".into()))?;

    let event = app_state.webhook_verifier.verify(&body, signature)?;

    match app_state.reconciler.handle_event(&event).await {
        Ok(WebhookOutcome::Reconciled(outcome)) => {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.kind.as_str(),
                outcome = ?outcome,
                "Webhook processed"
            );
        }
        Ok(WebhookOutcome::Ignored(reason)) => {
            tracing::debug!(event_id = %event.id, reason = %reason, "Webhook ignored");
        }
        Err(err) if err.is_transient() => {
            tracing::error!(
                error = %err,
                event_id = %event.id,
                event_type = %event.kind.as_str(),
                retryable = true,
                "Webhook processing failed, returning 500 for redelivery"
            );
            return Err(err);
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                event_id = %event.id,
                event_type = %event.kind.as_str(),
                "Webhook could not be applied, acknowledging"
            );
        }
    }

    Ok(Json(json!({ "received": true })))
}
