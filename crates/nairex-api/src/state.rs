//! Application state shared across handlers.
//!
//! Everything is constructed once in the composition root and threaded
//! through; the services are cheap to clone (pools and `Arc`s inside).

use std::sync::Arc;

use nairex_services::{
    AccountService, DepositService, SwapService, WalletService, WithdrawalService,
};
use nairex_types::RateTable;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub wallets: WalletService,
    pub swaps: SwapService,
    pub withdrawals: WithdrawalService,
    pub deposits: DepositService,
    pub rates: Arc<RateTable>,
}
