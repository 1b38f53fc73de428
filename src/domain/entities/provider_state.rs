use serde::Serialize;

/// Settlement state of a checkout as reported by the payment provider.
///
/// Derived from the checkout session's `payment_status` and, when known, the
/// status of its payment intent. The two fields can disagree, so the checks
/// run in a fixed priority order: pending, paid, failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPaymentState {
    Pending,
    Paid,
    Failed,
    Unrecognized,
}

const PENDING: &[&str] = &["processing", "requires_action"];
const SESSION_FAILED: &[&str] = &["unpaid", "canceled", "expired"];
const INTENT_FAILED: &[&str] = &["requires_payment_method", "canceled"];

impl ProviderPaymentState {
    pub fn classify(session_status: Option<&str>, intent_status: Option<&str>) -> Self {
        if is_in(session_status, PENDING) || is_in(intent_status, PENDING) {
            ProviderPaymentState::Pending
        } else if session_status == Some("paid") || intent_status == Some("succeeded") {
            ProviderPaymentState::Paid
        } else if is_in(session_status, SESSION_FAILED) || is_in(intent_status, INTENT_FAILED) {
            ProviderPaymentState::Failed
        } else {
            ProviderPaymentState::Unrecognized
        }
    }
}

fn is_in(status: Option<&str>, set: &[&str]) -> bool {
    status.is_some_and(|s| set.iter().any(|candidate| *candidate == s))
}
