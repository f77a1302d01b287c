//! Per-domain repositories.

mod accounts;
mod swaps;
mod tokens;
mod wallets;
mod withdrawals;

pub use accounts::AccountRepo;
pub use swaps::SwapRepo;
pub use tokens::TokenRepo;
pub use wallets::WalletRepo;
pub use withdrawals::{WithdrawalKey, WithdrawalRepo};

/// `?, ?, ...` placeholder list for IN clauses.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
