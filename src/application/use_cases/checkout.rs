use std::sync::Arc;

use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::{
            CheckoutRequest, CheckoutResult, CheckoutUrls, PaymentProviderPort, PremiumPlan,
        },
        use_cases::account::{AccountRepo, resolve_account},
        validators::{is_valid_email, required},
    },
};

#[derive(Clone)]
pub struct CheckoutUseCases {
    accounts: Arc<dyn AccountRepo>,
    provider: Arc<dyn PaymentProviderPort>,
    plan: PremiumPlan,
    client_url: String,
}

impl CheckoutUseCases {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        provider: Arc<dyn PaymentProviderPort>,
        plan: PremiumPlan,
        client_url: String,
    ) -> Self {
        Self {
            accounts,
            provider,
            plan,
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls {
            success_url: format!(
                "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.client_url
            ),
            cancel_url: format!("{}/payment/cancel?reason=cancelled", self.client_url),
        }
    }

    /// Open a hosted checkout for the premium plan.
    ///
    /// Provider failures surface as `Upstream` and are not retried here.
    #[instrument(skip(self))]
    pub async fn initiate(
        &self,
        account_id: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<CheckoutResult> {
        let email = required(email, "email").map_err(AppError::InvalidInput)?;
        let account_id = required(account_id, "accountId").map_err(AppError::InvalidInput)?;
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }

        let account = resolve_account(self.accounts.as_ref(), Some(account_id), Some(email))
            .await?
            .ok_or(AppError::NotFound)?;

        if account.has_verified_premium() {
            return Err(AppError::InvalidInput(
                "Account already has premium access".into(),
            ));
        }

        let request = CheckoutRequest {
            account_id: account.id,
            email: email.to_string(),
            plan: self.plan.clone(),
            urls: self.checkout_urls(),
        };

        let checkout = self.provider.create_checkout(&request).await?;

        let recorded = self
            .accounts
            .record_checkout_session(account.id, &checkout.session_id)
            .await?;
        if !recorded {
            tracing::warn!(
                account_id = %account.id,
                session_id = %checkout.session_id,
                "Checkout session not recorded; account became premium meanwhile"
            );
        }

        tracing::info!(
            account_id = %account.id,
            session_id = %checkout.session_id,
            "Checkout session created"
        );
        Ok(checkout)
    }
}
