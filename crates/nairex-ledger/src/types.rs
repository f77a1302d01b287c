//! Wire types of the ledger engine.

use serde::{Deserialize, Serialize};

/// Flags set at account creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
    /// Chain this event with the next one in the batch; the chain is atomic.
    pub linked: bool,
    /// Retain per-transfer history for this account.
    pub history: bool,
    /// Reject transfers that would let debits exceed posted credits.
    pub debits_must_not_exceed_credits: bool,
}

/// A ledger account. Balances are maintained by the engine; callers supply
/// identity, ledger index, code, flags and an optional user-data tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u128,
    pub ledger: u32,
    pub code: u16,
    /// Free-form 128-bit tag; the orchestrator stores the owning account id.
    pub user_data_128: u128,
    pub flags: AccountFlags,
    pub debits_pending: u128,
    pub debits_posted: u128,
    pub credits_pending: u128,
    pub credits_posted: u128,
    /// Engine-assigned creation time, nanoseconds.
    pub timestamp: u64,
}

/// Flags on a transfer submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFlags {
    /// Chain this event with the next one in the batch; the chain is atomic.
    pub linked: bool,
    /// Place a hold instead of posting immediately.
    pub pending: bool,
    /// Post the pending transfer named by `pending_id`.
    pub post_pending_transfer: bool,
    /// Void the pending transfer named by `pending_id`.
    pub void_pending_transfer: bool,
}

/// A double-entry transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: u128,
    pub debit_account_id: u128,
    pub credit_account_id: u128,
    /// Integer amount at the universal 1e9 scale. For post/void resolutions
    /// an amount of zero means "the full pending amount".
    pub amount: u128,
    /// Pending transfer this resolution targets; zero otherwise.
    pub pending_id: u128,
    pub user_data_128: u128,
    pub user_data_64: u64,
    pub user_data_32: u32,
    /// Advisory expiry (unix seconds); the orchestrator drives expiry
    /// itself, the engine stores the value verbatim.
    pub timeout: u32,
    pub ledger: u32,
    pub code: u16,
    pub flags: TransferFlags,
    /// Engine-assigned commit time, nanoseconds.
    pub timestamp: u64,
}

/// Why an account creation was rejected. Only failures are reported; an
/// empty result list means the whole batch succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateAccountCode {
    IdMustNotBeZero,
    LedgerMustNotBeZero,
    CodeMustNotBeZero,
    Exists,
    ExistsWithDifferentFlags,
    ExistsWithDifferentLedger,
    ExistsWithDifferentCode,
    ExistsWithDifferentUserData,
    LinkedEventFailed,
    LinkedEventChainOpen,
}

impl CreateAccountCode {
    /// An "exists with the same shape or a different one" family code.
    /// Idempotent bootstrap treats the same-shape variant as success.
    pub fn is_exists(&self) -> bool {
        matches!(
            self,
            Self::Exists
                | Self::ExistsWithDifferentFlags
                | Self::ExistsWithDifferentLedger
                | Self::ExistsWithDifferentCode
                | Self::ExistsWithDifferentUserData
        )
    }
}

/// Why a transfer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateTransferCode {
    IdMustNotBeZero,
    AmountMustNotBeZero,
    FlagsAreMutuallyExclusive,
    DebitAccountNotFound,
    CreditAccountNotFound,
    AccountsMustBeDifferent,
    AccountsMustHaveTheSameLedger,
    PendingIdMustNotBeZero,
    PendingTransferNotFound,
    /// The referenced pending transfer has already been posted or voided.
    PendingTransferNotPending,
    ExceedsPendingTransferAmount,
    /// The debit account is capped and the transfer would push debits past
    /// posted credits.
    ExceedsCredits,
    Exists,
    LinkedEventFailed,
    LinkedEventChainOpen,
}

impl CreateTransferCode {
    /// Replay of an operation that already resolved; callers treat this as
    /// benign during confirm/reversal races and retries.
    pub fn is_benign_replay(&self) -> bool {
        matches!(self, Self::Exists | Self::PendingTransferNotPending)
    }
}

/// Per-index failure from a `create_accounts` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountsResult {
    pub index: usize,
    pub code: CreateAccountCode,
}

/// Per-index failure from a `create_transfers` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransfersResult {
    pub index: usize,
    pub code: CreateTransferCode,
}

/// Filter for `query_transfers`. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFilter {
    pub user_data_128: Option<u128>,
    pub user_data_64: Option<u64>,
    pub ledger: Option<u32>,
    pub code: Option<u16>,
    /// Newest first.
    pub reversed: bool,
    pub limit: usize,
}

/// Filter for `account_transfers`: the transfers touching one account.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountFilter {
    pub account_id: Option<u128>,
    pub user_data_128: Option<u128>,
    pub code: Option<u16>,
    /// Match transfers crediting the account.
    pub credits: bool,
    /// Match transfers debiting the account.
    pub debits: bool,
    /// Newest first.
    pub reversed: bool,
    pub limit: usize,
}
