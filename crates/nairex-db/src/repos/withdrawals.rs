//! Withdrawal repository.
//!
//! Reads are always scoped to a viewer: a withdrawal is visible to the
//! owner of the debited wallet and to the recipient account named in
//! `recipient_destination_tag`.

use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use crate::models::DbWithdrawal;

const COLUMNS: &str = "withdrawals.id, withdrawals.wallet_id, withdrawals.reference, \
                       withdrawals.tx_id, withdrawals.transaction_note, withdrawals.narration, \
                       withdrawals.status, withdrawals.recipient_type, \
                       withdrawals.recipient_name, withdrawals.recipient_destination_tag, \
                       withdrawals.recipient_address, withdrawals.created_at";

/// How a single withdrawal is addressed.
pub enum WithdrawalKey<'a> {
    Id(&'a str),
    Reference(&'a str),
}

pub struct WithdrawalRepo {
    pool: SqlitePool,
}

impl WithdrawalRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        withdrawal: &DbWithdrawal,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO withdrawals (id, wallet_id, reference, tx_id, transaction_note, \
             narration, status, recipient_type, recipient_name, recipient_destination_tag, \
             recipient_address, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.wallet_id)
        .bind(&withdrawal.reference)
        .bind(&withdrawal.tx_id)
        .bind(&withdrawal.transaction_note)
        .bind(&withdrawal.narration)
        .bind(&withdrawal.status)
        .bind(&withdrawal.recipient_type)
        .bind(&withdrawal.recipient_name)
        .bind(&withdrawal.recipient_destination_tag)
        .bind(&withdrawal.recipient_address)
        .bind(withdrawal.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Fetch one withdrawal visible to `viewer_account_id`.
    pub async fn find_for_account(
        &self,
        viewer_account_id: &str,
        key: WithdrawalKey<'_>,
    ) -> DbResult<Option<DbWithdrawal>> {
        let column = match key {
            WithdrawalKey::Id(_) => "withdrawals.id",
            WithdrawalKey::Reference(_) => "withdrawals.reference",
        };
        let value = match key {
            WithdrawalKey::Id(v) | WithdrawalKey::Reference(v) => v,
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM withdrawals \
             JOIN wallets ON withdrawals.wallet_id = wallets.id \
             WHERE (wallets.account_id = ? OR withdrawals.recipient_destination_tag = ?) \
             AND {column} = ?"
        );
        let withdrawal = sqlx::query_as::<_, DbWithdrawal>(&sql)
            .bind(viewer_account_id)
            .bind(viewer_account_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(withdrawal)
    }

    /// List the withdrawals visible to `viewer_account_id`, optionally
    /// narrowed by currency and status.
    pub async fn list_for_account(
        &self,
        viewer_account_id: &str,
        currency: Option<&str>,
        status: Option<&str>,
    ) -> DbResult<Vec<DbWithdrawal>> {
        let mut sql = format!(
            "SELECT {COLUMNS} FROM withdrawals \
             JOIN wallets ON withdrawals.wallet_id = wallets.id \
             WHERE (wallets.account_id = ? OR withdrawals.recipient_destination_tag = ?)"
        );
        if currency.is_some() {
            sql.push_str(" AND wallets.currency = ?");
        }
        if status.is_some() {
            sql.push_str(" AND withdrawals.status = ?");
        }
        sql.push_str(" ORDER BY withdrawals.created_at DESC");

        let mut query = sqlx::query_as::<_, DbWithdrawal>(&sql)
            .bind(viewer_account_id)
            .bind(viewer_account_id);
        if let Some(currency) = currency {
            query = query.bind(currency);
        }
        if let Some(status) = status {
            query = query.bind(status);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}
