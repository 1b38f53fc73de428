use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{
        CheckoutRequest, CheckoutResult, PaymentProviderPort, SessionSnapshot,
    },
    domain::entities::payment_event::PaymentMetadata,
    infra::stripe_client::{CheckoutSessionParams, StripeCheckoutSession, StripeClient},
};

pub const METADATA_ACCOUNT_ID: &str = "accountId";
pub const METADATA_EMAIL: &str = "email";

/// Adapter that wraps StripeClient to implement PaymentProviderPort.
#[derive(Clone)]
pub struct StripePaymentAdapter {
    client: StripeClient,
}

impl StripePaymentAdapter {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: StripeClient::new(secret_key),
        }
    }
}

/// Pull `{accountId, email}` out of provider metadata, falling back to the
/// session's customer email.
pub fn metadata_from_stripe(
    metadata: &HashMap<String, String>,
    customer_email: Option<&str>,
) -> PaymentMetadata {
    let non_empty = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    PaymentMetadata {
        account_id: non_empty(metadata.get(METADATA_ACCOUNT_ID).map(String::as_str)),
        email: non_empty(metadata.get(METADATA_EMAIL).map(String::as_str)).or_else(|| non_empty(customer_email)),
    }
}

fn snapshot_from_session(session: StripeCheckoutSession) -> SessionSnapshot {
    let intent_status = session
        .payment_intent
        .as_ref()
        .and_then(|intent| intent.status())
        .map(str::to_string);

    SessionSnapshot {
        metadata: metadata_from_stripe(&session.metadata, session.customer_email.as_deref()),
        session_id: session.id,
        payment_status: session.payment_status,
        intent_status,
    }
}

#[async_trait]
impl PaymentProviderPort for StripePaymentAdapter {
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutResult> {
        let account_id = request.account_id.to_string();
        let params = CheckoutSessionParams {
            customer_email: &request.email,
            client_reference_id: &account_id,
            product_name: &request.plan.product_name,
            product_description: &request.plan.description,
            product_image: request.plan.image_url.as_deref(),
            unit_amount: request.plan.unit_amount,
            currency: &request.plan.currency,
            success_url: &request.urls.success_url,
            cancel_url: &request.urls.cancel_url,
            metadata: HashMap::from([
                (METADATA_ACCOUNT_ID, account_id.as_str()),
                (METADATA_EMAIL, request.email.as_str()),
            ]),
        };

        let session = self.client.create_checkout_session(&params).await?;
        let url = session
            .url
            .ok_or_else(|| AppError::Upstream("Stripe checkout session has no URL".into()))?;

        Ok(CheckoutResult {
            url,
            session_id: session.id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> AppResult<SessionSnapshot> {
        let session = self.client.retrieve_checkout_session(session_id).await?;
        Ok(snapshot_from_session(session))
    }

    async fn find_session_for_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AppResult<Option<String>> {
        let sessions = self
            .client
            .list_checkout_sessions_for_payment_intent(payment_intent_id)
            .await?;
        Ok(sessions.into_iter().next().map(|s| s.id))
    }
}
