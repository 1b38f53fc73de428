//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` creates an `AppState` backed by the in-memory account
//! repo and the stub payment provider.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            account::AccountUseCases, checkout::CheckoutUseCases,
            payment_reconciler::PaymentReconciler,
        },
    },
    domain::entities::account::Account,
    infra::{config::AppConfig, stripe_webhook::StripeWebhookVerifier},
    test_utils::{InMemoryAccountRepo, StubPaymentProvider, TEST_WEBHOOK_SECRET, test_premium_plan},
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// ```ignore
/// let account = create_test_account(|_| {});
/// let (app_state, repo, provider) = TestAppStateBuilder::new()
///     .with_account(account.clone())
///     .build_with_mocks();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    accounts: Vec<Account>,
    provider: Option<Arc<StubPaymentProvider>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Use a preconfigured provider (sessions, failure mode).
    pub fn with_provider(mut self, provider: Arc<StubPaymentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Returns the mocks alongside the state for assertions.
    pub fn build_with_mocks(self) -> (AppState, Arc<InMemoryAccountRepo>, Arc<StubPaymentProvider>) {
        let repo = Arc::new(InMemoryAccountRepo::with_accounts(self.accounts));
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(StubPaymentProvider::new()));

        let config = test_config();

        let account_use_cases = AccountUseCases::new(repo.clone());
        let checkout_use_cases = CheckoutUseCases::new(
            repo.clone(),
            provider.clone(),
            config.premium_plan.clone(),
            config.client_url.to_string(),
        );
        let reconciler = PaymentReconciler::new(repo.clone(), provider.clone());
        let webhook_verifier = StripeWebhookVerifier::new(
            config.stripe_webhook_secret.clone(),
            config.stripe_webhook_tolerance_secs,
        );

        let app_state = AppState {
            config: Arc::new(config),
            account_use_cases: Arc::new(account_use_cases),
            checkout_use_cases: Arc::new(checkout_use_cases),
            reconciler: Arc::new(reconciler),
            webhook_verifier: Arc::new(webhook_verifier),
        };

        (app_state, repo, provider)
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        access_token_ttl: Duration::minutes(30),
        cors_origin: HeaderValue::from_static("http://localhost:5173"),
        bind_addr: "127.0.0.1:5001".parse::<SocketAddr>().unwrap(),
        database_url: String::new(),
        database_max_connections: 1,
        client_url: Url::parse("http://localhost:5173").unwrap(),
        stripe_secret_key: SecretString::new("sk_test_unused".into()),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        stripe_webhook_tolerance_secs: 300,
        premium_plan: test_premium_plan(),
    }
}

/// `Authorization` header value for `account`.
pub fn bearer_for(account: &Account) -> String {
    let token = jwt::issue(
        account.id,
        &account.email,
        &SecretString::new(TEST_JWT_SECRET.into()),
        Duration::minutes(30),
    )
    .unwrap();
    format!("Bearer {}", token)
}
