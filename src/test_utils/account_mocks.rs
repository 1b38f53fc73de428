//! In-memory mock implementation of the account repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::account::{AccountRepo, NewAccount, ProfileUpdate},
    domain::entities::{account::Account, entitlement::EntitlementUpdate},
};

// ============================================================================
// InMemoryAccountRepo
// ============================================================================

/// Every write happens under one lock, mirroring the single-statement updates
/// of the Postgres adapter.
#[derive(Default)]
pub struct InMemoryAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
    entitlement_writes: AtomicUsize,
}

impl InMemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let map: HashMap<Uuid, Account> = accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
            entitlement_writes: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().unwrap().get(&id).cloned()
    }

    /// Number of entitlement updates that actually changed a row.
    pub fn entitlement_writes(&self) -> usize {
        self.entitlement_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccountRepo {
    async fn create(&self, input: &NewAccount) -> AppResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == input.email) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: input.email.clone(),
            display_name: input.display_name.clone(),
            photo_url: input.photo_url.clone(),
            is_premium: false,
            payment_status: None,
            premium_activated_at: None,
            last_payment_attempt: None,
            stripe_session_id: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let email = email.to_lowercase();
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Account>> {
        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.display_name {
            account.display_name = name.clone();
        }
        if let Some(photo) = &update.photo_url {
            account.photo_url = Some(photo.clone());
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn atomic_update_entitlement(
        &self,
        id: Uuid,
        update: &EntitlementUpdate,
    ) -> AppResult<Option<Account>> {
        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };
        if !update.apply_to(account) {
            return Ok(None);
        }
        self.entitlement_writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(account.clone()))
    }

    async fn record_checkout_session(&self, id: Uuid, session_id: &str) -> AppResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(&id) {
            Some(account) if !account.is_premium => {
                account.stripe_session_id = Some(session_id.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::entitlement::DenialReason;
    use crate::test_utils::create_test_account;

    #[tokio::test]
    async fn guard_rejection_is_not_counted_as_write() {
        let account = create_test_account(|a| a.stripe_session_id = Some("cs_b".into()));
        let repo = InMemoryAccountRepo::with_accounts(vec![account.clone()]);

        let result = repo
            .atomic_update_entitlement(
                account.id,
                &EntitlementUpdate::Deny {
                    session_id: "cs_a".into(),
                    reason: DenialReason::Failed,
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(repo.entitlement_writes(), 0);
        assert_eq!(repo.get(account.id).unwrap(), account);
    }

    #[tokio::test]
    async fn record_checkout_session_skips_premium_accounts() {
        let premium = create_test_account(|a| a.is_premium = true);
        let repo = InMemoryAccountRepo::with_accounts(vec![premium.clone()]);
        assert!(!repo.record_checkout_session(premium.id, "cs_x").await.unwrap());
        assert!(repo.get(premium.id).unwrap().stripe_session_id.is_none());
    }
}
