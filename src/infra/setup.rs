use crate::{
    adapters::http::app_state::AppState,
    infra::{
        config::AppConfig, postgres_persistence, stripe_payment_adapter::StripePaymentAdapter,
        stripe_webhook::StripeWebhookVerifier,
    },
    application::{ports::payment_provider::PaymentProviderPort, use_cases::account::AccountRepo},
    use_cases::{
        account::AccountUseCases, checkout::CheckoutUseCases, payment_reconciler::PaymentReconciler,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.database_max_connections).await?);
    let account_repo_arc = postgres_arc.clone() as Arc<dyn AccountRepo>;

    let provider = Arc::new(StripePaymentAdapter::new(config.stripe_secret_key.clone()))
        as Arc<dyn PaymentProviderPort>;

    let account_use_cases = AccountUseCases::new(account_repo_arc.clone());

    let checkout_use_cases = CheckoutUseCases::new(
        account_repo_arc.clone(),
        provider.clone(),
        config.premium_plan.clone(),
        config.client_url.to_string(),
    );

    let reconciler = PaymentReconciler::new(account_repo_arc, provider);

    let webhook_verifier = StripeWebhookVerifier::new(
        config.stripe_webhook_secret.clone(),
        config.stripe_webhook_tolerance_secs,
    );

    Ok(AppState {
        config: Arc::new(config),
        account_use_cases: Arc::new(account_use_cases),
        checkout_use_cases: Arc::new(checkout_use_cases),
        reconciler: Arc::new(reconciler),
        webhook_verifier: Arc::new(webhook_verifier),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "life_lessons_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("app.log unavailable, logging to console only: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
