use std::sync::Arc;

use crate::{
    application::use_cases::{
        account::AccountUseCases, checkout::CheckoutUseCases, payment_reconciler::PaymentReconciler,
    },
    infra::{config::AppConfig, stripe_webhook::StripeWebhookVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub account_use_cases: Arc<AccountUseCases>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
    pub reconciler: Arc<PaymentReconciler>,
    pub webhook_verifier: Arc<StripeWebhookVerifier>,
}
