//! Instant-swap repository.

use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use crate::models::DbInstantSwap;

const COLUMNS: &str = "id, quotation_id, from_wallet_id, to_wallet_id, quotation_rate, \
                       execution_rate, quote_tx_id_0, quote_tx_id_1, swap_tx_id_0, \
                       swap_tx_id_1, created_at";

pub struct SwapRepo {
    pool: SqlitePool,
}

impl SwapRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        swap: &DbInstantSwap,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO instant_swaps (id, quotation_id, from_wallet_id, to_wallet_id, \
             quotation_rate, execution_rate, quote_tx_id_0, quote_tx_id_1, swap_tx_id_0, \
             swap_tx_id_1, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&swap.id)
        .bind(&swap.quotation_id)
        .bind(&swap.from_wallet_id)
        .bind(&swap.to_wallet_id)
        .bind(swap.quotation_rate)
        .bind(swap.execution_rate)
        .bind(&swap.quote_tx_id_0)
        .bind(&swap.quote_tx_id_1)
        .bind(&swap.swap_tx_id_0)
        .bind(&swap.swap_tx_id_1)
        .bind(swap.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_quotation(&self, quotation_id: &str) -> DbResult<Option<DbInstantSwap>> {
        let swap = sqlx::query_as::<_, DbInstantSwap>(&format!(
            "SELECT {COLUMNS} FROM instant_swaps WHERE quotation_id = ?"
        ))
        .bind(quotation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(swap)
    }

    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<DbInstantSwap>> {
        let swap = sqlx::query_as::<_, DbInstantSwap>(&format!(
            "SELECT {COLUMNS} FROM instant_swaps WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(swap)
    }
}
