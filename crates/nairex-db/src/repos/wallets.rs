//! Wallet-reference repository.

use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use crate::models::DbWallet;
use crate::repos::placeholders;

pub struct WalletRepo {
    pool: SqlitePool,
}

impl WalletRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_many(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        wallets: &[DbWallet],
    ) -> DbResult<()> {
        for wallet in wallets {
            sqlx::query("INSERT INTO wallets (id, account_id, currency) VALUES (?, ?, ?)")
                .bind(&wallet.id)
                .bind(&wallet.account_id)
                .bind(&wallet.currency)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT id, account_id, currency FROM wallets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(wallet)
    }

    /// The single (account, currency) wallet.
    pub async fn find(&self, account_id: &str, currency: &str) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT id, account_id, currency FROM wallets WHERE account_id = ? AND currency = ?",
        )
        .bind(account_id)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(wallet)
    }

    pub async fn list_by_account(&self, account_id: &str) -> DbResult<Vec<DbWallet>> {
        let wallets = sqlx::query_as::<_, DbWallet>(
            "SELECT id, account_id, currency FROM wallets WHERE account_id = ? ORDER BY currency",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(wallets)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<DbWallet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, account_id, currency FROM wallets WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, DbWallet>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}
