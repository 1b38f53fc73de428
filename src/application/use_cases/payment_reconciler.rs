//! Payment status reconciliation.
//!
//! Both the client verification poll and the provider webhook end up in
//! [`PaymentReconciler::reconcile`]. Each decision is written with one atomic
//! conditional update, so duplicated or reordered deliveries converge without
//! any in-process locking.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::PaymentProviderPort,
        use_cases::account::{AccountRepo, resolve_account},
    },
    domain::entities::{
        account::Account,
        entitlement::{DenialReason, EntitlementDecision},
        payment_event::{PaymentEvent, PaymentEventKind, PaymentMetadata},
        provider_state::ProviderPaymentState,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Granted(Account),
    Denied(Account),
    /// Denial for a session the account no longer tracks. Nothing changed.
    StaleDenial,
    /// Provider is still settling. Nothing changed.
    Pending,
    /// Status neither paid nor explicitly failed. Nothing changed.
    Withheld,
}

/// Result of a client-initiated verification poll.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub outcome: ReconcileOutcome,
    pub payment_status: Option<String>,
    pub intent_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Reconciled(ReconcileOutcome),
    Ignored(String),
}

#[derive(Clone)]
pub struct PaymentReconciler {
    accounts: Arc<dyn AccountRepo>,
    provider: Arc<dyn PaymentProviderPort>,
}

impl PaymentReconciler {
    pub fn new(accounts: Arc<dyn AccountRepo>, provider: Arc<dyn PaymentProviderPort>) -> Self {
        Self { accounts, provider }
    }

    /// Apply `decision` for `session_id` to the account named by `metadata`.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        session_id: &str,
        decision: EntitlementDecision,
        metadata: &PaymentMetadata,
    ) -> AppResult<ReconcileOutcome> {
        match decision {
            EntitlementDecision::NoOp => {
                tracing::debug!(session_id, "Payment still processing, leaving entitlement unchanged");
                return Ok(ReconcileOutcome::Pending);
            }
            EntitlementDecision::Withhold => {
                tracing::warn!(
                    session_id,
                    account_id = ?metadata.account_id,
                    email = ?metadata.email,
                    "Unrecognized payment status, entitlement left unchanged for manual review"
                );
                return Ok(ReconcileOutcome::Withheld);
            }
            EntitlementDecision::Grant | EntitlementDecision::Deny(_) => {}
        }

        if metadata.is_empty() {
            return Err(AppError::InvalidInput(
                "Account info not found in session metadata".into(),
            ));
        }

        let account = resolve_account(
            self.accounts.as_ref(),
            metadata.account_id.as_deref(),
            metadata.email.as_deref(),
        )
        .await?
        .ok_or(AppError::NotFound)?;

        let Some(update) = decision.to_update(session_id, Utc::now()) else {
            return Ok(ReconcileOutcome::Withheld);
        };

        let updated = self
            .accounts
            .atomic_update_entitlement(account.id, &update)
            .await?;

        match (decision, updated) {
            (EntitlementDecision::Grant, Some(account)) => {
                tracing::info!(account_id = %account.id, session_id, "Premium granted");
                Ok(ReconcileOutcome::Granted(account))
            }
            (EntitlementDecision::Deny(reason), Some(account)) => {
                tracing::info!(
                    account_id = %account.id,
                    session_id,
                    reason = ?reason,
                    "Premium denied"
                );
                Ok(ReconcileOutcome::Denied(account))
            }
            (EntitlementDecision::Deny(_), None) => {
                tracing::warn!(
                    account_id = %account.id,
                    session_id,
                    current_session = ?account.stripe_session_id,
                    "Ignoring denial for a session the account no longer tracks"
                );
                Ok(ReconcileOutcome::StaleDenial)
            }
            // Account deleted between lookup and write.
            _ => Err(AppError::NotFound),
        }
    }

    /// Client poll after the checkout redirect.
    #[instrument(skip(self))]
    pub async fn verify_session(&self, session_id: Option<&str>) -> AppResult<PaymentVerification> {
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Session ID is required".into()))?;

        // A missing session is bad client input; `NotFound` stays reserved for the account.
        let snapshot = self
            .provider
            .retrieve_session(session_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound => AppError::InvalidInput("Checkout session not found".into()),
                other => other,
            })?;
        let state = ProviderPaymentState::classify(
            snapshot.payment_status.as_deref(),
            snapshot.intent_status.as_deref(),
        );

        let outcome = self
            .reconcile(
                &snapshot.session_id,
                EntitlementDecision::from_provider_state(state),
                &snapshot.metadata,
            )
            .await?;

        Ok(PaymentVerification {
            outcome,
            payment_status: snapshot.payment_status,
            intent_status: snapshot.intent_status,
        })
    }

    /// Provider webhook, already authenticated.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.kind.as_str()))]
    pub async fn handle_event(&self, event: &PaymentEvent) -> AppResult<WebhookOutcome> {
        let (session_id, decision) = match &event.kind {
            PaymentEventKind::CheckoutCompleted => {
                let state = ProviderPaymentState::classify(event.status.as_deref(), None);
                if state != ProviderPaymentState::Paid {
                    tracing::info!(
                        session_id = %event.object_id,
                        status = ?event.status,
                        "Checkout completed without payment, waiting for settlement"
                    );
                    return Ok(WebhookOutcome::Ignored(
                        "checkout completed without payment".into(),
                    ));
                }
                (event.object_id.clone(), EntitlementDecision::Grant)
            }
            PaymentEventKind::CheckoutExpired => (
                event.object_id.clone(),
                EntitlementDecision::Deny(DenialReason::Expired),
            ),
            PaymentEventKind::PaymentFailed => {
                match self
                    .provider
                    .find_session_for_payment_intent(&event.object_id)
                    .await?
                {
                    Some(session_id) => (session_id, EntitlementDecision::Deny(DenialReason::Failed)),
                    None => {
                        tracing::info!(
                            payment_intent = %event.object_id,
                            "Failed payment intent has no checkout session"
                        );
                        return Ok(WebhookOutcome::Ignored(
                            "payment intent without checkout session".into(),
                        ));
                    }
                }
            }
            PaymentEventKind::Other(event_type) => {
                tracing::debug!("Unhandled webhook event type: {}", event_type);
                return Ok(WebhookOutcome::Ignored(format!("unhandled event type {}", event_type)));
            }
        };

        let outcome = self.reconcile(&session_id, decision, &event.metadata).await?;
        Ok(WebhookOutcome::Reconciled(outcome))
    }
}
