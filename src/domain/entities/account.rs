use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::payment_status::PaymentStatus;

/// A user account with its display profile and premium entitlement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub is_premium: bool,
    pub payment_status: Option<PaymentStatus>,
    pub premium_activated_at: Option<DateTime<Utc>>,
    pub last_payment_attempt: Option<DateTime<Utc>>,
    pub stripe_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Premium access is only ever backed by a successful payment.
    pub fn has_verified_premium(&self) -> bool {
        self.is_premium && self.payment_status.is_some_and(|s| s.is_paid())
    }
}
