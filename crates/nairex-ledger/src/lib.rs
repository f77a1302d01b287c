//! Double-entry ledger gateway.
//!
//! All monetary state lives in a double-entry engine with three transfer
//! primitives: an immediate posting, a *pending* transfer that places a hold
//! on the debit side, and a resolution that either posts or voids a pending
//! transfer by id. Batches submitted with the `linked` flag are atomic: the
//! whole chain commits or none of it does.
//!
//! # Invariants
//!
//! 1. For accounts flagged `debits_must_not_exceed_credits`, the engine
//!    rejects any transfer that would push posted + pending debits past
//!    posted credits (`exceeds_credits`).
//! 2. A pending transfer resolves at most once. The losing side of a
//!    post/void race observes `pending_transfer_not_pending`.
//! 3. Ids are idempotence keys: resubmitting a transfer id that already
//!    committed fails with `exists` and has no further effect.
//!
//! The orchestration layer only ever talks to the [`LedgerClient`] trait;
//! [`InMemoryLedger`] is the reference engine behind it.

pub mod client;
pub mod engine;
pub mod types;

pub use client::{LedgerClient, LedgerError};
pub use engine::InMemoryLedger;
pub use types::{
    Account, AccountFilter, AccountFlags, CreateAccountCode, CreateAccountsResult,
    CreateTransferCode, CreateTransfersResult, QueryFilter, Transfer, TransferFlags,
};
