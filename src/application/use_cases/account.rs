use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::{is_valid_email, normalize_email, required},
    domain::entities::{account::Account, entitlement::EntitlementUpdate},
};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// Display-field edits. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn create(&self, input: &NewAccount) -> AppResult<Account>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;
    /// Touches display fields and `updated_at` only.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Account>>;
    /// Single conditional write. Returns `None` when the account is gone or the
    /// ordering guard rejected the update.
    async fn atomic_update_entitlement(
        &self,
        id: Uuid,
        update: &EntitlementUpdate,
    ) -> AppResult<Option<Account>>;
    /// Remember the latest checkout session. Only applies while the account is not premium.
    async fn record_checkout_session(&self, id: Uuid, session_id: &str) -> AppResult<bool>;
}

/// Find the target account: exact id first, then email.
///
/// Ids that are not valid UUIDs are treated as absent.
pub async fn resolve_account(
    repo: &dyn AccountRepo,
    account_id: Option<&str>,
    email: Option<&str>,
) -> AppResult<Option<Account>> {
    if let Some(id) = account_id.and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        && let Some(account) = repo.find_by_id(id).await?
    {
        return Ok(Some(account));
    }

    match email.map(normalize_email) {
        Some(email) if !email.is_empty() => repo.find_by_email(&email).await,
        _ => Ok(None),
    }
}

#[derive(Clone)]
pub struct AccountUseCases {
    repo: Arc<dyn AccountRepo>,
}

impl AccountUseCases {
    pub fn new(repo: Arc<dyn AccountRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn register(
        &self,
        email: Option<&str>,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> AppResult<Account> {
        let email = required(email, "email").map_err(AppError::InvalidInput)?;
        let display_name = required(display_name, "displayName").map_err(AppError::InvalidInput)?;
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }

        let email = normalize_email(email);
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::InvalidInput("User already exists".into()));
        }

        let account = self
            .repo
            .create(&NewAccount {
                email,
                display_name: display_name.to_string(),
                photo_url: photo_url
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account created");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Account> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<Account> {
        if actor_id != id {
            return Err(AppError::Forbidden);
        }

        let update = ProfileUpdate {
            display_name: update
                .display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            photo_url: update.photo_url.map(|p| p.trim().to_string()),
        };

        self.repo
            .update_profile(id, &update)
            .await?
            .ok_or(AppError::NotFound)
    }
}
