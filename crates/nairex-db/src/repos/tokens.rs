//! Access-token repository.

use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use crate::models::DbAccessToken;

pub struct TokenRepo {
    pool: SqlitePool,
}

impl TokenRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        token: &DbAccessToken,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO access_tokens (id, name, description, account_id, token) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token.id)
        .bind(&token.name)
        .bind(&token.description)
        .bind(&token.account_id)
        .bind(&token.token)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn list_by_account(&self, account_id: &str) -> DbResult<Vec<DbAccessToken>> {
        let tokens = sqlx::query_as::<_, DbAccessToken>(
            "SELECT id, name, description, account_id, token FROM access_tokens \
             WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }
}
