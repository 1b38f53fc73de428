use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use crate::app_error::{AppError, AppResult};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    // ========================================================================
    // Checkout Sessions
    // ========================================================================

    /// One-time card payment for a single line item.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> AppResult<StripeCheckoutSession> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .form(&params.to_form())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    /// Retrieve a session with its payment intent expanded.
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> AppResult<StripeCheckoutSession> {
        let response = self
            .client
            .get(checkout_session_url(session_id)?)
            .header("Authorization", self.auth_header())
            .query(&[("expand[]", "payment_intent")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    pub async fn list_checkout_sessions_for_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AppResult<Vec<StripeCheckoutSession>> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .query(&[("payment_intent", payment_intent_id), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        let list: StripeList<StripeCheckoutSession> = self.handle_response(response).await?;
        Ok(list.data)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read response: {}", e)))?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(body = %body, "Stripe resource not found");
            return Err(AppError::NotFound);
        }

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::Upstream(format!(
                    "Stripe error: {}",
                    error.error.message.unwrap_or(error.error.error_type)
                )));
            }

            return Err(AppError::Upstream(format!(
                "Stripe API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Upstream(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// The id is caller supplied, so it is appended as one escaped path segment.
fn checkout_session_url(session_id: &str) -> AppResult<Url> {
    let mut url = Url::parse(STRIPE_API_BASE)
        .map_err(|e| AppError::Internal(format!("Invalid Stripe API base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal("Stripe API base cannot hold a path".into()))?
        .extend(["checkout", "sessions", session_id]);
    Ok(url)
}

/// Parameters for a one-time checkout session.
#[derive(Debug)]
pub struct CheckoutSessionParams<'a> {
    pub customer_email: &'a str,
    pub client_reference_id: &'a str,
    pub product_name: &'a str,
    pub product_description: &'a str,
    pub product_image: Option<&'a str>,
    pub unit_amount: i64,
    pub currency: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    /// Copied to both the session and its payment intent.
    pub metadata: HashMap<&'a str, &'a str>,
}

impl CheckoutSessionParams<'_> {
    fn to_form(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.currency.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                self.unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                self.product_name.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                self.product_description.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), self.success_url.to_string()),
            ("cancel_url".to_string(), self.cancel_url.to_string()),
            ("customer_email".to_string(), self.customer_email.to_string()),
            (
                "client_reference_id".to_string(),
                self.client_reference_id.to_string(),
            ),
        ];

        if let Some(image) = self.product_image {
            params.push((
                "line_items[0][price_data][product_data][images][0]".to_string(),
                image.to_string(),
            ));
        }

        for (key, value) in &self.metadata {
            params.push((format!("metadata[{}]", key), value.to_string()));
            params.push((
                format!("payment_intent_data[metadata][{}]", key),
                value.to_string(),
            ));
        }

        params
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: Option<String>,
    pub customer_email: Option<String>,
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Either an id string or, when expanded, the payment intent object.
    pub payment_intent: Option<StripePaymentIntentRef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StripePaymentIntentRef {
    Id(String),
    Expanded(StripePaymentIntent),
}

impl StripePaymentIntentRef {
    pub fn status(&self) -> Option<&str> {
        match self {
            StripePaymentIntentRef::Id(_) => None,
            StripePaymentIntentRef::Expanded(intent) => Some(intent.status.as_str()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
    pub code: Option<String>,
}
