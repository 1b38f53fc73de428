use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{
        account::Account, entitlement::EntitlementUpdate, payment_status::PaymentStatus,
    },
    use_cases::account::{AccountRepo, NewAccount, ProfileUpdate},
};

const ACCOUNT_COLUMNS: &str = "id, email, display_name, photo_url, is_premium, payment_status, \
     premium_activated_at, last_payment_attempt, stripe_session_id, created_at, updated_at";

// Account row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
struct AccountDb {
    id: Uuid,
    email: String,
    display_name: String,
    photo_url: Option<String>,
    is_premium: bool,
    payment_status: Option<PaymentStatus>,
    premium_activated_at: Option<DateTime<Utc>>,
    last_payment_attempt: Option<DateTime<Utc>>,
    stripe_session_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountDb> for Account {
    fn from(row: AccountDb) -> Self {
        Account {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            is_premium: row.is_premium,
            payment_status: row.payment_status,
            premium_activated_at: row.premium_activated_at,
            last_payment_attempt: row.last_payment_attempt,
            stripe_session_id: row.stripe_session_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AccountRepo for PostgresPersistence {
    async fn create(&self, input: &NewAccount) -> AppResult<Account> {
        let sql = format!(
            "INSERT INTO users (id, email, display_name, photo_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountDb>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.photo_url)
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, AccountDb>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.map(Account::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, AccountDb>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.map(Account::from))
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Account>> {
        let sql = format!(
            "UPDATE users SET \
                display_name = COALESCE($2, display_name), \
                photo_url = COALESCE($3, photo_url), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountDb>(&sql)
            .bind(id)
            .bind(&update.display_name)
            .bind(&update.photo_url)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.map(Account::from))
    }

    // Same rules as `EntitlementUpdate::apply_to`; the in-memory repo uses that
    // directly. SET expressions read the pre-update row, so each CASE compares
    // against the state before this write.
    async fn atomic_update_entitlement(
        &self,
        id: Uuid,
        update: &EntitlementUpdate,
    ) -> AppResult<Option<Account>> {
        let row = match update {
            EntitlementUpdate::Grant { session_id, at } => {
                let sql = format!(
                    "UPDATE users SET \
                        premium_activated_at = CASE \
                            WHEN is_premium AND stripe_session_id = $2 THEN premium_activated_at \
                            ELSE $3 END, \
                        is_premium = TRUE, \
                        payment_status = 'paid', \
                        stripe_session_id = $2 \
                     WHERE id = $1 \
                     RETURNING {ACCOUNT_COLUMNS}"
                );
                sqlx::query_as::<_, AccountDb>(&sql)
                    .bind(id)
                    .bind(session_id)
                    .bind(at)
                    .fetch_optional(self.pool())
                    .await
            }
            EntitlementUpdate::Deny {
                session_id,
                reason,
                at,
            } => {
                let sql = format!(
                    "UPDATE users SET \
                        last_payment_attempt = CASE \
                            WHEN NOT is_premium AND payment_status = $3 AND stripe_session_id = $2 \
                            THEN last_payment_attempt \
                            ELSE $4 END, \
                        is_premium = FALSE, \
                        payment_status = $3, \
                        stripe_session_id = $2 \
                     WHERE id = $1 \
                       AND (stripe_session_id IS NULL OR stripe_session_id = $2) \
                     RETURNING {ACCOUNT_COLUMNS}"
                );
                sqlx::query_as::<_, AccountDb>(&sql)
                    .bind(id)
                    .bind(session_id)
                    .bind(reason.payment_status())
                    .bind(at)
                    .fetch_optional(self.pool())
                    .await
            }
        }
        .map_err(AppError::from)?;

        Ok(row.map(Account::from))
    }

    async fn record_checkout_session(&self, id: Uuid, session_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET stripe_session_id = $2 WHERE id = $1 AND NOT is_premium",
        )
        .bind(id)
        .bind(session_id)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
