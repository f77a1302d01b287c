//! Financial-transaction orchestration layer.
//!
//! The services translate API intents into atomic, reversible ledger
//! operations, reconcile them with the metadata store, drive time-based
//! state transitions through the in-process scheduler and deliver signed
//! webhook notifications off the request path.
//!
//! Every monetary action spans the two stores. Two orderings are used:
//!
//! - account provisioning commits its relational transaction only after the
//!   ledger batch succeeded (ledger ids are fresh, so a retry is safe);
//! - swaps and withdrawals write metadata inside an open transaction, call
//!   the ledger, and roll the metadata back if the ledger refuses.
//!
//! Balances are never cached: they are derived from ledger account state on
//! every read.

pub mod account;
pub mod deposit;
pub mod scheduler;
pub mod swap;
pub mod views;
pub mod wallet;
pub mod webhook;
pub mod withdrawal;

pub use account::{AccountService, AuthedAccount, Scope};
pub use deposit::DepositService;
pub use scheduler::Scheduler;
pub use swap::SwapService;
pub use wallet::WalletService;
pub use webhook::{WebhookDetails, WebhookDispatcher, WebhookEvent};
pub use withdrawal::WithdrawalService;
