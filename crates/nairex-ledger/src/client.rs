//! The gateway trait the orchestration layer programs against.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    Account, AccountFilter, CreateAccountsResult, CreateTransfersResult, QueryFilter, Transfer,
};

/// Transport-level failure talking to the engine. Batch-level rejections are
/// not errors; they come back as per-index results.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("ledger engine unavailable: {0}")]
    Unavailable(String),
}

/// Typed wrapper over the double-entry engine.
///
/// Every state-mutating call is all-or-nothing at the chain level when the
/// `linked` flag is used. Implementations MUST NOT retry on their own;
/// retries are the caller's decision.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a batch of account creations. An empty result means every
    /// account was created.
    async fn create_accounts(
        &self,
        accounts: Vec<Account>,
    ) -> Result<Vec<CreateAccountsResult>, LedgerError>;

    /// Submit a batch of transfers. An empty result means every transfer
    /// committed.
    async fn create_transfers(
        &self,
        transfers: Vec<Transfer>,
    ) -> Result<Vec<CreateTransfersResult>, LedgerError>;

    /// Batched point read; missing ids are skipped, order follows the
    /// request.
    async fn lookup_accounts(&self, ids: Vec<u128>) -> Result<Vec<Account>, LedgerError>;

    /// Batched point read; missing ids are skipped, order follows the
    /// request.
    async fn lookup_transfers(&self, ids: Vec<u128>) -> Result<Vec<Transfer>, LedgerError>;

    /// Range scan over transfers by user-data tags and ledger.
    async fn query_transfers(&self, filter: QueryFilter) -> Result<Vec<Transfer>, LedgerError>;

    /// The transfers touching a single account.
    async fn account_transfers(&self, filter: AccountFilter)
        -> Result<Vec<Transfer>, LedgerError>;
}
