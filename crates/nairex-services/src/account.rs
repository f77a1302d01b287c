//! Account service: principal hierarchy, provisioning, token resolution.
//!
//! Creating a principal provisions one ledger account per currency in a
//! single linked batch, then commits the relational rows. The ledger side
//! is idempotent on fresh ids, so if the relational commit fails the only
//! cost is a handful of orphaned ledger accounts; a retry generates new ids
//! and succeeds.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use nairex_db::{Database, DbAccessToken, DbAccount, DbWallet};
use nairex_ledger::{Account as LedgerAccount, AccountFlags, LedgerClient};
use nairex_types::{id, Currency, Error, Result};

use crate::views::UserView;
use crate::webhook::WebhookDetails;

/// The authenticated principal attached to a request, with its effective
/// webhook settings already resolved (sub-accounts inherit the parent's).
#[derive(Debug, Clone)]
pub struct AuthedAccount {
    pub account: DbAccount,
    pub webhook: WebhookDetails,
}

impl AuthedAccount {
    pub fn id(&self) -> &str {
        &self.account.id
    }
}

/// Who is asking. `Internal` is reserved for trusted in-process callers
/// (scheduler, swap processor) and bypasses the parent/child scope check.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Internal,
    AsUser(&'a AuthedAccount),
}

#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateSubAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditSubAccount {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
    ledger: Arc<dyn LedgerClient>,
}

impl AccountService {
    pub fn new(db: Database, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { db, ledger }
    }

    /// Create a main account with credentials, a default access token and
    /// one wallet per supported currency.
    pub async fn create_account(
        &self,
        req: CreateAccount,
    ) -> Result<(UserView, DbAccessToken)> {
        require_fields(&[
            ("email", &req.email),
            ("password", &req.password),
            ("first_name", &req.first_name),
            ("last_name", &req.last_name),
            ("display_name", &req.display_name),
        ])?;
        let now = Utc::now();
        let account_uuid = Uuid::new_v4();
        let account = DbAccount {
            id: account_uuid.to_string(),
            sn: random_slug(14),
            display_name: req.display_name,
            email: req.email.to_lowercase(),
            first_name: title_case(&req.first_name),
            last_name: title_case(&req.last_name),
            phone_number: None,
            is_main: true,
            parent_id: None,
            callback_url: None,
            webhook_key: None,
            created_at: now,
            updated_at: now,
        };
        let password_hash = hash_password(&req.password)?;
        let token = DbAccessToken {
            id: Uuid::new_v4().to_string(),
            name: "Default Token".to_string(),
            description: "default token for user requests".to_string(),
            account_id: account.id.clone(),
            token: format!("pub_test_{}", random_slug(16)),
        };
        let (ledger_accounts, wallet_rows) = provision_wallets(account_uuid, &account.id);

        let mut tx = self.db.begin().await?;
        self.db.accounts().insert(&mut tx, &account).await.map_err(|err| {
            if err.is_unique_violation() {
                Error::entry_exists("email already in use")
            } else {
                err.into()
            }
        })?;
        self.db
            .accounts()
            .insert_credentials(&mut tx, &account.id, &password_hash)
            .await?;
        self.db.tokens().insert(&mut tx, &token).await?;
        self.db.wallets().insert_many(&mut tx, &wallet_rows).await?;

        let failures = self
            .ledger
            .create_accounts(ledger_accounts)
            .await
            .map_err(Error::fatal)?;
        if !failures.is_empty() {
            return Err(Error::fatal(format!("failed to create user wallets: {failures:?}")));
        }
        tx.commit().await.map_err(nairex_db::DbError::from)?;

        info!(account_id = %account.id, "account created");
        Ok((UserView::from_account(&account), token))
    }

    /// Create a sub-account under the authenticated main account. No
    /// credentials or token; the sub-account shares the parent's webhook.
    pub async fn create_sub_account(
        &self,
        caller: &AuthedAccount,
        req: CreateSubAccount,
    ) -> Result<UserView> {
        if !caller.account.is_main {
            return Err(Error::permission("only main accounts can create sub-accounts"));
        }
        require_fields(&[
            ("email", &req.email),
            ("first_name", &req.first_name),
            ("last_name", &req.last_name),
        ])?;
        let now = Utc::now();
        let account_uuid = Uuid::new_v4();
        let first_name = title_case(&req.first_name);
        let last_name = title_case(&req.last_name);
        let account = DbAccount {
            id: account_uuid.to_string(),
            sn: random_slug(14),
            display_name: format!("{first_name} {last_name}"),
            email: req.email.to_lowercase(),
            first_name,
            last_name,
            phone_number: None,
            is_main: false,
            parent_id: Some(caller.account.id.clone()),
            callback_url: None,
            webhook_key: None,
            created_at: now,
            updated_at: now,
        };
        let (ledger_accounts, wallet_rows) = provision_wallets(account_uuid, &account.id);

        let mut tx = self.db.begin().await?;
        self.db.accounts().insert(&mut tx, &account).await?;
        self.db.wallets().insert_many(&mut tx, &wallet_rows).await?;

        let failures = self
            .ledger
            .create_accounts(ledger_accounts)
            .await
            .map_err(Error::fatal)?;
        if !failures.is_empty() {
            return Err(Error::fatal(format!("failed to create user wallets: {failures:?}")));
        }
        tx.commit().await.map_err(nairex_db::DbError::from)?;

        info!(account_id = %account.id, parent_id = %caller.account.id, "sub-account created");
        Ok(UserView::from_account(&account))
    }

    /// Upsert the webhook settings on the caller's main account.
    pub async fn update_webhook(
        &self,
        caller: &AuthedAccount,
        callback_url: Option<String>,
        webhook_key: Option<String>,
    ) -> Result<()> {
        let main_id = if caller.account.is_main {
            caller.account.id.clone()
        } else {
            caller.account.parent_id.clone().unwrap_or_else(|| caller.account.id.clone())
        };
        let callback_url = callback_url.filter(|url| !url.is_empty());
        self.db
            .accounts()
            .update_webhook(&main_id, callback_url.as_deref(), webhook_key.as_deref())
            .await?;
        Ok(())
    }

    /// Fetch an account row. `"me"` binds to the authenticated principal.
    ///
    /// Scope rule: a parent may fetch itself or any of its sub-accounts; a
    /// sub-account only itself. `Scope::Internal` bypasses the predicate.
    pub async fn fetch_account(&self, scope: Scope<'_>, user_id: &str) -> Result<DbAccount> {
        let target_id = match (user_id, &scope) {
            ("me", Scope::AsUser(caller)) => caller.account.id.clone(),
            ("me", Scope::Internal) => {
                return Err(Error::validation("invalid user id provided"));
            }
            _ => user_id.to_string(),
        };
        let account = self
            .db
            .accounts()
            .find_by_id(&target_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;

        if let Scope::AsUser(caller) = scope {
            let caller_id = caller.account.id.as_str();
            let allowed = account.id == caller_id
                || account.parent_id.as_deref() == Some(caller_id);
            if !allowed {
                return Err(Error::not_found("user not found"));
            }
        }
        Ok(account)
    }

    pub async fn fetch_account_view(&self, scope: Scope<'_>, user_id: &str) -> Result<UserView> {
        Ok(UserView::from_account(&self.fetch_account(scope, user_id).await?))
    }

    /// List the caller's sub-accounts.
    pub async fn fetch_sub_accounts(&self, caller: &AuthedAccount) -> Result<Vec<UserView>> {
        if !caller.account.is_main {
            return Err(Error::permission("only main accounts have sub-accounts"));
        }
        let subs = self.db.accounts().list_sub_accounts(&caller.account.id).await?;
        Ok(subs.iter().map(UserView::from_account).collect())
    }

    /// Edit a sub-account's names and phone number.
    pub async fn edit_sub_account(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        req: EditSubAccount,
    ) -> Result<UserView> {
        let target = self.fetch_account(Scope::AsUser(caller), user_id).await?;
        if target.parent_id.as_deref() != Some(caller.account.id.as_str()) {
            return Err(Error::permission("only sub-account details can be edited"));
        }
        let first_name = req
            .first_name
            .map(|name| title_case(&name))
            .unwrap_or_else(|| target.first_name.clone());
        let last_name = req
            .last_name
            .map(|name| title_case(&name))
            .unwrap_or_else(|| target.last_name.clone());
        let phone_number = req.phone_number.or_else(|| target.phone_number.clone());

        self.db
            .accounts()
            .update_details(&target.id, &first_name, &last_name, phone_number.as_deref())
            .await?;
        let updated = self
            .db
            .accounts()
            .find_by_id(&target.id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        Ok(UserView::from_account(&updated))
    }

    /// Map a bearer token to its principal, with webhook settings resolved.
    pub async fn resolve_token(&self, token: &str) -> Result<AuthedAccount> {
        let account = self
            .db
            .accounts()
            .find_by_token(token)
            .await?
            .ok_or_else(Error::invalid_token)?;
        let webhook = self.webhook_details_for(&account).await?;
        Ok(AuthedAccount { account, webhook })
    }

    /// Effective webhook settings: a sub-account inherits its parent's.
    pub async fn webhook_details_for(&self, account: &DbAccount) -> Result<WebhookDetails> {
        if account.is_main {
            return Ok(WebhookDetails {
                callback_url: account.callback_url.clone(),
                webhook_key: account.webhook_key.clone(),
            });
        }
        let Some(parent_id) = account.parent_id.as_deref() else {
            return Ok(WebhookDetails::default());
        };
        let parent = self.db.accounts().find_by_id(parent_id).await?;
        Ok(parent
            .map(|parent| WebhookDetails {
                callback_url: parent.callback_url,
                webhook_key: parent.webhook_key,
            })
            .unwrap_or_default())
    }
}

/// One ledger account + wallet row per currency, chained into a single
/// atomic batch (`linked` on every element but the last).
fn provision_wallets(account_uuid: Uuid, account_id: &str) -> (Vec<LedgerAccount>, Vec<DbWallet>) {
    let total = Currency::ALL.len();
    let mut ledger_accounts = Vec::with_capacity(total);
    let mut rows = Vec::with_capacity(total);
    for (position, currency) in Currency::ALL.iter().enumerate() {
        let wallet_id = id::new_ledger_id();
        ledger_accounts.push(LedgerAccount {
            id: wallet_id,
            ledger: currency.ledger_index(),
            code: 1,
            user_data_128: id::uuid_to_u128(account_uuid),
            flags: AccountFlags {
                linked: position < total - 1,
                history: true,
                debits_must_not_exceed_credits: true,
            },
            ..Default::default()
        });
        rows.push(DbWallet {
            id: id::encode_hex(wallet_id),
            account_id: account_id.to_string(),
            currency: currency.code().to_string(),
        });
    }
    (ledger_accounts, rows)
}

fn require_fields(fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(Error::validation(format!("{name} is required")));
        }
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(Error::fatal)
}

fn random_slug(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nairex_ledger::InMemoryLedger;

    fn create_request(email: &str) -> CreateAccount {
        CreateAccount {
            email: email.to_string(),
            password: "correct horse battery staple".to_string(),
            first_name: "ada".to_string(),
            last_name: "OBI".to_string(),
            display_name: "Ada Trading".to_string(),
        }
    }

    async fn service() -> AccountService {
        let db = Database::in_memory().await.unwrap();
        AccountService::new(db, Arc::new(InMemoryLedger::new()))
    }

    #[test]
    fn title_case_normalizes_words() {
        assert_eq!(title_case("ada"), "Ada");
        assert_eq!(title_case("OBI"), "Obi");
        assert_eq!(title_case("mary jane"), "Mary Jane");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn creating_a_principal_provisions_all_wallets() {
        let svc = service().await;
        let (user, token) = svc.create_account(create_request("Ada@Example.com")).await.unwrap();

        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Obi");
        assert!(token.token.starts_with("pub_test_"));

        let wallets = svc.db.wallets().list_by_account(&user.id).await.unwrap();
        assert_eq!(wallets.len(), Currency::ALL.len());

        let ledger_ids: Vec<u128> =
            wallets.iter().map(|w| id::decode_hex(&w.id).unwrap()).collect();
        let accounts = svc.ledger.lookup_accounts(ledger_ids).await.unwrap();
        assert_eq!(accounts.len(), Currency::ALL.len());
        for account in accounts {
            assert!(account.flags.debits_must_not_exceed_credits);
            assert_eq!(account.credits_posted, 0);
        }
    }

    #[tokio::test]
    async fn duplicate_main_email_is_rejected() {
        let svc = service().await;
        svc.create_account(create_request("dup@example.com")).await.unwrap();
        let err = svc.create_account(create_request("dup@example.com")).await.unwrap_err();
        assert_eq!(err.kind, nairex_types::ErrorKind::EntryExists);
    }

    #[tokio::test]
    async fn token_resolution_and_scope_rules() {
        let svc = service().await;
        let (parent, token) = svc.create_account(create_request("scope@example.com")).await.unwrap();

        let caller = svc.resolve_token(&token.token).await.unwrap();
        assert_eq!(caller.account.id, parent.id);
        assert!(svc.resolve_token("pub_test_bogus").await.is_err());

        let sub = svc
            .create_sub_account(
                &caller,
                CreateSubAccount {
                    email: "sub@example.com".to_string(),
                    first_name: "sub".to_string(),
                    last_name: "one".to_string(),
                },
            )
            .await
            .unwrap();

        // Parent sees itself (via the sentinel) and its sub.
        let me = svc.fetch_account(Scope::AsUser(&caller), "me").await.unwrap();
        assert_eq!(me.id, parent.id);
        assert!(svc.fetch_account(Scope::AsUser(&caller), &sub.id).await.is_ok());

        // A different principal sees neither.
        let (_, other_token) = svc.create_account(create_request("other@example.com")).await.unwrap();
        let other = svc.resolve_token(&other_token.token).await.unwrap();
        assert!(svc.fetch_account(Scope::AsUser(&other), &sub.id).await.is_err());
        assert!(svc.fetch_account(Scope::AsUser(&other), &parent.id).await.is_err());

        // Internal scope bypasses the predicate.
        assert!(svc.fetch_account(Scope::Internal, &sub.id).await.is_ok());
    }

    #[tokio::test]
    async fn sub_accounts_inherit_the_parent_webhook() {
        let svc = service().await;
        let (_, token) = svc.create_account(create_request("hooks@example.com")).await.unwrap();
        let caller = svc.resolve_token(&token.token).await.unwrap();

        svc.update_webhook(
            &caller,
            Some("https://example.com/hook".to_string()),
            Some("whk_1".to_string()),
        )
        .await
        .unwrap();

        let sub = svc
            .create_sub_account(
                &caller,
                CreateSubAccount {
                    email: "subhooks@example.com".to_string(),
                    first_name: "Sub".to_string(),
                    last_name: "Hooks".to_string(),
                },
            )
            .await
            .unwrap();
        let sub_row = svc.fetch_account(Scope::Internal, &sub.id).await.unwrap();
        let webhook = svc.webhook_details_for(&sub_row).await.unwrap();
        assert_eq!(webhook.callback_url.as_deref(), Some("https://example.com/hook"));
        assert_eq!(webhook.webhook_key.as_deref(), Some("whk_1"));
    }
}
