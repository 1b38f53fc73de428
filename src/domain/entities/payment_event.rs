/// Event types the reconciler acts on. Everything else is acknowledged and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    CheckoutCompleted,
    CheckoutExpired,
    PaymentFailed,
    Other(String),
}

impl PaymentEventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => PaymentEventKind::CheckoutCompleted,
            "checkout.session.expired" => PaymentEventKind::CheckoutExpired,
            "payment_intent.payment_failed" => PaymentEventKind::PaymentFailed,
            other => PaymentEventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentEventKind::CheckoutCompleted => "checkout.session.completed",
            PaymentEventKind::CheckoutExpired => "checkout.session.expired",
            PaymentEventKind::PaymentFailed => "payment_intent.payment_failed",
            PaymentEventKind::Other(other) => other,
        }
    }
}

/// Account correlation attached to a checkout session at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMetadata {
    pub account_id: Option<String>,
    pub email: Option<String>,
}

impl PaymentMetadata {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.email.is_none()
    }
}

/// An authenticated provider notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub id: String,
    pub kind: PaymentEventKind,
    /// Checkout session id for session events, payment intent id for intent events.
    pub object_id: String,
    /// Session `payment_status` or intent `status`, whichever the object carries.
    pub status: Option<String>,
    pub metadata: PaymentMetadata,
}
