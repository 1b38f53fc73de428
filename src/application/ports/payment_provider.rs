use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::payment_event::PaymentMetadata};

// ============================================================================
// Port Types - Provider-agnostic types
// ============================================================================

/// Fixed single-line-item price charged for premium access.
#[derive(Debug, Clone)]
pub struct PremiumPlan {
    pub product_name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Amount in the currency's minor unit.
    pub unit_amount: i64,
    pub currency: String,
}

/// URLs for checkout redirects
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Everything the provider needs to open a checkout for one account.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub account_id: Uuid,
    pub email: String,
    pub plan: PremiumPlan,
    pub urls: CheckoutUrls,
}

/// Result of creating a checkout session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub url: String,
    pub session_id: String,
}

/// Provider-side view of a checkout session at the time of the call.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub payment_status: Option<String>,
    pub intent_status: Option<String>,
    pub metadata: PaymentMetadata,
}

// ============================================================================
// Port Trait
// ============================================================================

#[async_trait]
pub trait PaymentProviderPort: Send + Sync {
    /// Create a hosted checkout. Never retried: a retry could open a second session.
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutResult>;

    /// Fetch a session together with its payment intent status.
    async fn retrieve_session(&self, session_id: &str) -> AppResult<SessionSnapshot>;

    /// Find the checkout session that owns a payment intent, if any.
    async fn find_session_for_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AppResult<Option<String>>;
}
