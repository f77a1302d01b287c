//! Relational metadata store.
//!
//! The metadata store is the authoritative source for identifiers and
//! human-readable attributes: accounts, credentials, access tokens, wallet
//! references, instant-swap records and withdrawals. Monetary state never
//! lives here; balances are always derived from the ledger engine.
//!
//! # Repository pattern
//!
//! Each domain has its own repository over the shared pool. Multi-write
//! flows open an explicit transaction, do their relational writes, call the
//! ledger, and commit only once the ledger accepted the batch.

pub mod error;
pub mod models;
pub mod repos;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::info;

pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::{AccountRepo, SwapRepo, TokenRepo, WalletRepo, WithdrawalKey, WithdrawalRepo};

/// Embedded schema, applied idempotently at connect time.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY,
    sn            TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    email         TEXT NOT NULL,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    phone_number  TEXT,
    is_main       INTEGER NOT NULL DEFAULT 0,
    parent_id     TEXT REFERENCES accounts(id),
    callback_url  TEXT,
    webhook_key   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_main_email
    ON accounts(email) WHERE is_main = 1;

CREATE INDEX IF NOT EXISTS idx_accounts_parent ON accounts(parent_id);

CREATE TABLE IF NOT EXISTS credentials (
    account_id    TEXT PRIMARY KEY REFERENCES accounts(id),
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS access_tokens (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    account_id  TEXT NOT NULL REFERENCES accounts(id),
    token       TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS wallets (
    id         TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    currency   TEXT NOT NULL,
    UNIQUE (account_id, currency)
);

CREATE TABLE IF NOT EXISTS instant_swaps (
    id             TEXT PRIMARY KEY,
    quotation_id   TEXT NOT NULL UNIQUE,
    from_wallet_id TEXT NOT NULL REFERENCES wallets(id),
    to_wallet_id   TEXT NOT NULL REFERENCES wallets(id),
    quotation_rate INTEGER NOT NULL,
    execution_rate INTEGER NOT NULL,
    quote_tx_id_0  TEXT NOT NULL,
    quote_tx_id_1  TEXT NOT NULL,
    swap_tx_id_0   TEXT NOT NULL,
    swap_tx_id_1   TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS withdrawals (
    id                        TEXT PRIMARY KEY,
    wallet_id                 TEXT NOT NULL REFERENCES wallets(id),
    reference                 TEXT NOT NULL,
    tx_id                     TEXT NOT NULL,
    transaction_note          TEXT NOT NULL DEFAULT '',
    narration                 TEXT NOT NULL DEFAULT '',
    status                    TEXT NOT NULL,
    recipient_type            TEXT NOT NULL,
    recipient_name            TEXT,
    recipient_destination_tag TEXT,
    recipient_address         TEXT,
    created_at                TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_withdrawals_wallet ON withdrawals(wallet_id);
CREATE INDEX IF NOT EXISTS idx_withdrawals_reference ON withdrawals(reference);
"#;

/// Shared connection pool plus repository accessors.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `url` and apply the schema.
    pub async fn connect(url: &str, max_connections: u32) -> DbResult<Self> {
        info!(url, "connecting to metadata store");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(DbError::from)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// A private in-memory database. A single connection keeps the store
    /// alive for the pool's lifetime.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DbError::from)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> DbResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open an explicit transaction.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub fn accounts(&self) -> AccountRepo {
        AccountRepo::new(self.pool.clone())
    }

    pub fn tokens(&self) -> TokenRepo {
        TokenRepo::new(self.pool.clone())
    }

    pub fn wallets(&self) -> WalletRepo {
        WalletRepo::new(self.pool.clone())
    }

    pub fn swaps(&self) -> SwapRepo {
        SwapRepo::new(self.pool.clone())
    }

    pub fn withdrawals(&self) -> WithdrawalRepo {
        WithdrawalRepo::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn account(email: &str, is_main: bool, parent: Option<&str>) -> DbAccount {
        let now = Utc::now();
        DbAccount {
            id: Uuid::new_v4().to_string(),
            sn: Uuid::new_v4().simple().to_string(),
            display_name: "Test".into(),
            email: email.into(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            phone_number: None,
            is_main,
            parent_id: parent.map(String::from),
            callback_url: None,
            webhook_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert_account(db: &Database, account: &DbAccount) {
        let mut tx = db.begin().await.unwrap();
        db.accounts().insert(&mut tx, account).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn account_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let main = account("ada@example.com", true, None);
        insert_account(&db, &main).await;

        let found = db.accounts().find_by_id(&main.id).await.unwrap().unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert!(found.is_main);
        assert!(found.parent_id.is_none());
    }

    #[tokio::test]
    async fn main_email_uniqueness_is_enforced() {
        let db = Database::in_memory().await.unwrap();
        insert_account(&db, &account("dup@example.com", true, None)).await;

        let mut tx = db.begin().await.unwrap();
        let err = db
            .accounts()
            .insert(&mut tx, &account("dup@example.com", true, None))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn sub_accounts_may_reuse_the_email() {
        let db = Database::in_memory().await.unwrap();
        let main = account("parent@example.com", true, None);
        insert_account(&db, &main).await;
        insert_account(&db, &account("parent@example.com", false, Some(&main.id))).await;

        let subs = db.accounts().list_sub_accounts(&main.id).await.unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn token_resolution_joins_the_account() {
        let db = Database::in_memory().await.unwrap();
        let main = account("token@example.com", true, None);
        insert_account(&db, &main).await;

        let mut tx = db.begin().await.unwrap();
        db.tokens()
            .insert(
                &mut tx,
                &DbAccessToken {
                    id: Uuid::new_v4().to_string(),
                    name: "Default Token".into(),
                    description: "default token for user requests".into(),
                    account_id: main.id.clone(),
                    token: "pub_test_abc123".into(),
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = db.accounts().find_by_token("pub_test_abc123").await.unwrap().unwrap();
        assert_eq!(found.id, main.id);
        assert!(db.accounts().find_by_token("pub_test_nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn one_wallet_per_currency() {
        let db = Database::in_memory().await.unwrap();
        let main = account("wallets@example.com", true, None);
        insert_account(&db, &main).await;

        let wallet = DbWallet {
            id: "0000000000000000000000000000000a".into(),
            account_id: main.id.clone(),
            currency: "ngn".into(),
        };
        let mut tx = db.begin().await.unwrap();
        db.wallets().insert_many(&mut tx, std::slice::from_ref(&wallet)).await.unwrap();
        tx.commit().await.unwrap();

        let mut dup = wallet.clone();
        dup.id = "0000000000000000000000000000000b".into();
        let mut tx = db.begin().await.unwrap();
        let err = db.wallets().insert_many(&mut tx, &[dup]).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn withdrawal_visibility_is_scoped() {
        let db = Database::in_memory().await.unwrap();
        let sender = account("sender@example.com", true, None);
        let recipient = account("recipient@example.com", true, None);
        let outsider = account("outsider@example.com", true, None);
        for a in [&sender, &recipient, &outsider] {
            insert_account(&db, a).await;
        }

        let wallet = DbWallet {
            id: "0000000000000000000000000000000c".into(),
            account_id: sender.id.clone(),
            currency: "btc".into(),
        };
        let mut tx = db.begin().await.unwrap();
        db.wallets().insert_many(&mut tx, std::slice::from_ref(&wallet)).await.unwrap();
        db.withdrawals()
            .insert(
                &mut tx,
                &DbWithdrawal {
                    id: Uuid::new_v4().to_string(),
                    wallet_id: wallet.id.clone(),
                    reference: "ref-1".into(),
                    tx_id: "tx-1".into(),
                    transaction_note: String::new(),
                    narration: String::new(),
                    status: "completed".into(),
                    recipient_type: "internal".into(),
                    recipient_name: Some("Ada".into()),
                    recipient_destination_tag: Some(recipient.id.clone()),
                    recipient_address: None,
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        for viewer in [&sender.id, &recipient.id] {
            let found = db
                .withdrawals()
                .find_for_account(viewer, WithdrawalKey::Reference("ref-1"))
                .await
                .unwrap();
            assert!(found.is_some(), "viewer {viewer} should see the withdrawal");
        }
        let hidden = db
            .withdrawals()
            .find_for_account(&outsider.id, WithdrawalKey::Reference("ref-1"))
            .await
            .unwrap();
        assert!(hidden.is_none());

        let listed = db
            .withdrawals()
            .list_for_account(&sender.id, Some("btc"), None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(db
            .withdrawals()
            .list_for_account(&sender.id, Some("eth"), None)
            .await
            .unwrap()
            .is_empty());
    }
}
