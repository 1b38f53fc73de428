//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    application::ports::payment_provider::{PremiumPlan, SessionSnapshot},
    domain::entities::{
        account::Account,
        payment_event::{PaymentEvent, PaymentEventKind, PaymentMetadata},
    },
};

/// Create a non-premium test account with sensible defaults.
pub fn create_test_account(overrides: impl FnOnce(&mut Account)) -> Account {
    let id = Uuid::new_v4();
    let mut account = Account {
        id,
        email: format!("reader-{}@example.com", id.simple()),
        display_name: "Test Reader".to_string(),
        photo_url: None,
        is_premium: false,
        payment_status: None,
        premium_activated_at: None,
        last_payment_attempt: None,
        stripe_session_id: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut account);
    account
}

/// Create a provider session snapshot whose metadata points at `account`.
pub fn create_test_session(
    session_id: &str,
    account: &Account,
    overrides: impl FnOnce(&mut SessionSnapshot),
) -> SessionSnapshot {
    let mut session = SessionSnapshot {
        session_id: session_id.to_string(),
        payment_status: Some("unpaid".to_string()),
        intent_status: None,
        metadata: PaymentMetadata {
            account_id: Some(account.id.to_string()),
            email: Some(account.email.clone()),
        },
    };
    overrides(&mut session);
    session
}

/// Create an authenticated payment event whose metadata points at `account`.
pub fn create_test_event(
    kind: PaymentEventKind,
    object_id: &str,
    account: &Account,
    overrides: impl FnOnce(&mut PaymentEvent),
) -> PaymentEvent {
    let mut event = PaymentEvent {
        id: format!("evt_{}", object_id),
        kind,
        object_id: object_id.to_string(),
        status: None,
        metadata: PaymentMetadata {
            account_id: Some(account.id.to_string()),
            email: Some(account.email.clone()),
        },
    };
    overrides(&mut event);
    event
}

pub fn test_premium_plan() -> PremiumPlan {
    PremiumPlan {
        product_name: "Digital Life Lessons - Premium Plan".to_string(),
        description: "Lifetime access to premium features".to_string(),
        image_url: None,
        unit_amount: 150_000,
        currency: "bdt".to_string(),
    }
}

/// Fixed timestamp for reproducible fixtures.
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}
