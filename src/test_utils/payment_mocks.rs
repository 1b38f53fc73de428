//! Stub payment provider and webhook signing helpers.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{
        CheckoutRequest, CheckoutResult, PaymentProviderPort, SessionSnapshot,
    },
};

// ============================================================================
// StubPaymentProvider
// ============================================================================

#[derive(Default)]
pub struct StubPaymentProvider {
    sessions: Mutex<HashMap<String, SessionSnapshot>>,
    intents: Mutex<HashMap<String, String>>,
    created: Mutex<Vec<CheckoutRequest>>,
    attempts: AtomicUsize,
    fail_requests: bool,
}

impl StubPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the provider were unreachable.
    pub fn failing() -> Self {
        Self {
            fail_requests: true,
            ..Self::default()
        }
    }

    pub fn add_session(&self, session: SessionSnapshot) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.session_id.clone(), session);
    }

    pub fn link_payment_intent(&self, payment_intent_id: &str, session_id: &str) {
        self.intents
            .lock()
            .unwrap()
            .insert(payment_intent_id.to_string(), session_id.to_string());
    }

    pub fn created_checkouts(&self) -> Vec<CheckoutRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn checkout_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn unavailable(&self) -> AppResult<()> {
        if self.fail_requests {
            return Err(AppError::Upstream("stub provider unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProviderPort for StubPaymentProvider {
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutResult> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.unavailable()?;

        let session_id = format!("cs_test_{}", n);
        self.created.lock().unwrap().push(request.clone());
        Ok(CheckoutResult {
            url: format!("https://checkout.stripe.test/c/pay/{}", session_id),
            session_id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> AppResult<SessionSnapshot> {
        self.unavailable()?;
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_session_for_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AppResult<Option<String>> {
        self.unavailable()?;
        Ok(self.intents.lock().unwrap().get(payment_intent_id).cloned())
    }
}

// ============================================================================
// Webhook signing
// ============================================================================

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Build a `Stripe-Signature` header value for `body`.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}

/// A Stripe-shaped event body for a checkout session.
pub fn stripe_session_event_body(
    event_type: &str,
    session_id: &str,
    payment_status: &str,
    account_id: &str,
    email: &str,
) -> String {
    serde_json::json!({
        "id": format!("evt_{}", session_id),
        "type": event_type,
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "payment_status": payment_status,
                "customer_email": email,
                "metadata": { "accountId": account_id, "email": email }
            }
        }
    })
    .to_string()
}
