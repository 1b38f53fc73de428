//! Entitlement decisions and the state transition each one applies.
//!
//! `EntitlementUpdate::apply_to` is the reference semantics for the atomic
//! conditional update. The Postgres adapter expresses the same rules in one
//! `UPDATE ... WHERE ... RETURNING` statement.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{account::Account, payment_status::PaymentStatus, provider_state::ProviderPaymentState};

/// Why premium access is being refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    Failed,
    Expired,
}

impl DenialReason {
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            DenialReason::Failed => PaymentStatus::Failed,
            DenialReason::Expired => PaymentStatus::Expired,
        }
    }
}

/// What the reconciler decided to do with an account's entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    Grant,
    Deny(DenialReason),
    /// Provider is still settling the charge. Nothing changes; poll again.
    NoOp,
    /// Not paid, but not an explicit failure either. Nothing changes.
    Withhold,
}

impl EntitlementDecision {
    pub fn from_provider_state(state: ProviderPaymentState) -> Self {
        match state {
            ProviderPaymentState::Pending => EntitlementDecision::NoOp,
            ProviderPaymentState::Paid => EntitlementDecision::Grant,
            ProviderPaymentState::Failed => EntitlementDecision::Deny(DenialReason::Failed),
            ProviderPaymentState::Unrecognized => EntitlementDecision::Withhold,
        }
    }

    /// Build the field update for decisions that mutate. `None` for `NoOp` and `Withhold`.
    pub fn to_update(&self, session_id: &str, at: DateTime<Utc>) -> Option<EntitlementUpdate> {
        match self {
            EntitlementDecision::Grant => Some(EntitlementUpdate::Grant {
                session_id: session_id.to_string(),
                at,
            }),
            EntitlementDecision::Deny(reason) => Some(EntitlementUpdate::Deny {
                session_id: session_id.to_string(),
                reason: *reason,
                at,
            }),
            EntitlementDecision::NoOp | EntitlementDecision::Withhold => None,
        }
    }
}

/// A single atomic change to an account's entitlement fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementUpdate {
    Grant {
        session_id: String,
        at: DateTime<Utc>,
    },
    Deny {
        session_id: String,
        reason: DenialReason,
        at: DateTime<Utc>,
    },
}

impl EntitlementUpdate {
    pub fn session_id(&self) -> &str {
        match self {
            EntitlementUpdate::Grant { session_id, .. } | EntitlementUpdate::Deny { session_id, .. } => {
                session_id
            }
        }
    }

    /// Whether the ordering guard lets this update touch `account`.
    ///
    /// Grants always apply. A denial only applies to the session the account
    /// currently tracks (or when it tracks none).
    pub fn applies_to(&self, account: &Account) -> bool {
        match self {
            EntitlementUpdate::Grant { .. } => true,
            EntitlementUpdate::Deny { session_id, .. } => account
                .stripe_session_id
                .as_deref()
                .is_none_or(|current| current == session_id),
        }
    }

    /// Apply to `account` in place. Returns false when the ordering guard rejected it.
    ///
    /// Re-applying the same update leaves the account unchanged, timestamps included.
    pub fn apply_to(&self, account: &mut Account) -> bool {
        if !self.applies_to(account) {
            return false;
        }

        match self {
            EntitlementUpdate::Grant { session_id, at } => {
                let already_granted = account.is_premium
                    && account.stripe_session_id.as_deref() == Some(session_id.as_str());
                if !already_granted {
                    account.premium_activated_at = Some(*at);
                }
                account.is_premium = true;
                account.payment_status = Some(PaymentStatus::Paid);
                account.stripe_session_id = Some(session_id.clone());
            }
            EntitlementUpdate::Deny {
                session_id,
                reason,
                at,
            } => {
                let status = reason.payment_status();
                let already_denied = !account.is_premium
                    && account.payment_status == Some(status)
                    && account.stripe_session_id.as_deref() == Some(session_id.as_str());
                if !already_denied {
                    account.last_payment_attempt = Some(*at);
                }
                account.is_premium = false;
                account.payment_status = Some(status);
                account.stripe_session_id = Some(session_id.clone());
            }
        }
        true
    }
}
