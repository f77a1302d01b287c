//! Account and credential repository.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use crate::models::DbAccount;
use crate::repos::placeholders;

const COLUMNS: &str = "id, sn, display_name, email, first_name, last_name, phone_number, \
                       is_main, parent_id, callback_url, webhook_key, created_at, updated_at";

pub struct AccountRepo {
    pool: SqlitePool,
}

impl AccountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an account row inside an open transaction.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        account: &DbAccount,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, sn, display_name, email, first_name, last_name, \
             phone_number, is_main, parent_id, callback_url, webhook_key, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.sn)
        .bind(&account.display_name)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone_number)
        .bind(account.is_main)
        .bind(&account.parent_id)
        .bind(&account.callback_url)
        .bind(&account.webhook_key)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// One-to-one with main accounts only.
    pub async fn insert_credentials(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        account_id: &str,
        password_hash: &str,
    ) -> DbResult<()> {
        sqlx::query("INSERT INTO credentials (account_id, password_hash) VALUES (?, ?)")
            .bind(account_id)
            .bind(password_hash)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<DbAccount>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {COLUMNS} FROM accounts WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, DbAccount>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn list_sub_accounts(&self, parent_id: &str) -> DbResult<Vec<DbAccount>> {
        let accounts = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE parent_id = ? ORDER BY created_at"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Resolve a bearer token to its account.
    pub async fn find_by_token(&self, token: &str) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(
            "SELECT accounts.id, accounts.sn, accounts.display_name, accounts.email, \
             accounts.first_name, accounts.last_name, accounts.phone_number, accounts.is_main, \
             accounts.parent_id, accounts.callback_url, accounts.webhook_key, \
             accounts.created_at, accounts.updated_at \
             FROM access_tokens \
             JOIN accounts ON access_tokens.account_id = accounts.id \
             WHERE access_tokens.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Upsert webhook settings on a main account.
    pub async fn update_webhook(
        &self,
        account_id: &str,
        callback_url: Option<&str>,
        webhook_key: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE accounts SET callback_url = ?, webhook_key = ?, updated_at = ? WHERE id = ?",
        )
        .bind(callback_url)
        .bind(webhook_key)
        .bind(Utc::now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the editable profile fields.
    pub async fn update_details(
        &self,
        account_id: &str,
        first_name: &str,
        last_name: &str,
        phone_number: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE accounts SET first_name = ?, last_name = ?, phone_number = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone_number)
        .bind(Utc::now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
