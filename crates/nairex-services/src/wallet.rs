//! Wallet service: live balances derived from ledger account state.
//!
//! available = credits_posted - debits_posted - debits_pending
//! locked    = debits_pending
//!
//! Balances are never cached or stored relationally. A pending hold shows
//! up in the very next read because it is part of `debits_pending`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use nairex_db::{Database, DbAccount, DbWallet};
use nairex_ledger::{Account as LedgerAccount, AccountFlags, LedgerClient};
use nairex_types::{amount, id, Currency, Error, Result};

use crate::account::{AccountService, Scope};
use crate::views::{UserView, WalletView};

/// A wallet view paired with its owner row, for callers that need to apply
/// visibility rules against the owner's place in the hierarchy.
#[derive(Debug, Clone)]
pub struct OwnedWallet {
    pub view: WalletView,
    pub owner: DbAccount,
}

#[derive(Clone)]
pub struct WalletService {
    db: Database,
    ledger: Arc<dyn LedgerClient>,
    accounts: AccountService,
}

impl WalletService {
    pub fn new(db: Database, ledger: Arc<dyn LedgerClient>, accounts: AccountService) -> Self {
        Self { db, ledger, accounts }
    }

    /// Create the per-currency system accounts (id = ledger index, code 2).
    /// Runs on every boot; an account that already exists with the same
    /// shape is success, anything else is fatal.
    pub async fn init_system_accounts(&self) -> Result<()> {
        let accounts: Vec<LedgerAccount> = Currency::ALL
            .iter()
            .map(|currency| LedgerAccount {
                id: currency.ledger_index() as u128,
                ledger: currency.ledger_index(),
                code: 2,
                flags: AccountFlags { history: true, ..Default::default() },
                ..Default::default()
            })
            .collect();

        let failures = self.ledger.create_accounts(accounts).await.map_err(Error::fatal)?;
        for failure in &failures {
            if !failure.code.is_exists() {
                return Err(Error::failed_dependency(format!(
                    "system account bootstrap failed: {:?}",
                    failure.code
                )));
            }
        }
        info!(currencies = Currency::ALL.len(), "system ledger accounts ready");
        Ok(())
    }

    /// Fetch one wallet of `user_id` by currency.
    pub async fn fetch_wallet(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        currency: Currency,
    ) -> Result<WalletView> {
        let account = self.accounts.fetch_account(scope, user_id).await?;
        self.wallet_for_account(&account, currency).await
    }

    /// Fetch a wallet for an already-resolved account row.
    pub async fn wallet_for_account(
        &self,
        account: &DbAccount,
        currency: Currency,
    ) -> Result<WalletView> {
        let wallet = self
            .db
            .wallets()
            .find(&account.id, currency.code())
            .await?
            .ok_or_else(|| Error::not_found("wallet not found"))?;
        let ledger_account = self.lookup_ledger_account(&wallet.id).await?;
        Ok(build_view(&wallet, &ledger_account, UserView::from_account(account)))
    }

    /// All wallets of `user_id`, one per currency.
    pub async fn fetch_wallets(&self, scope: Scope<'_>, user_id: &str) -> Result<Vec<WalletView>> {
        let account = self.accounts.fetch_account(scope, user_id).await?;
        let wallets = self.db.wallets().list_by_account(&account.id).await?;

        let ids: Vec<u128> = wallets
            .iter()
            .map(|w| id::decode_hex(&w.id))
            .collect::<Result<_>>()?;
        let ledger_accounts = self.ledger.lookup_accounts(ids).await.map_err(Error::fatal)?;
        let by_id: HashMap<u128, _> =
            ledger_accounts.into_iter().map(|a| (a.id, a)).collect();

        let user = UserView::from_account(&account);
        wallets
            .iter()
            .map(|wallet| {
                let ledger_account = by_id
                    .get(&id::decode_hex(&wallet.id)?)
                    .ok_or_else(|| Error::not_found("wallet not found"))?;
                Ok(build_view(wallet, ledger_account, user.clone()))
            })
            .collect()
    }

    /// Batched wallet resolution by ledger id, with owners attached. Used
    /// by withdrawal/deposit population; no scope check is applied here.
    pub async fn lookup_wallets(&self, ids: &[String]) -> Result<HashMap<String, OwnedWallet>> {
        let wallets = self.db.wallets().find_by_ids(ids).await?;
        let mut owner_ids: Vec<String> =
            wallets.iter().map(|w| w.account_id.clone()).collect();
        owner_ids.sort();
        owner_ids.dedup();
        let owners: HashMap<String, DbAccount> = self
            .db
            .accounts()
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        let ledger_ids: Vec<u128> = wallets
            .iter()
            .map(|w| id::decode_hex(&w.id))
            .collect::<Result<_>>()?;
        let ledger_accounts: HashMap<u128, _> = self
            .ledger
            .lookup_accounts(ledger_ids)
            .await
            .map_err(Error::fatal)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut out = HashMap::with_capacity(wallets.len());
        for wallet in wallets {
            let Some(owner) = owners.get(&wallet.account_id) else { continue };
            let Some(ledger_account) = ledger_accounts.get(&id::decode_hex(&wallet.id)?) else {
                continue;
            };
            let view = build_view(&wallet, ledger_account, UserView::from_account(owner));
            out.insert(wallet.id.clone(), OwnedWallet { view, owner: owner.clone() });
        }
        Ok(out)
    }

    async fn lookup_ledger_account(&self, wallet_id: &str) -> Result<LedgerAccount> {
        let ledger_id = id::decode_hex(wallet_id)?;
        self.ledger
            .lookup_accounts(vec![ledger_id])
            .await
            .map_err(Error::fatal)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("wallet not found"))
    }
}

fn build_view(wallet: &DbWallet, ledger_account: &LedgerAccount, user: UserView) -> WalletView {
    let currency: Currency = wallet.currency.parse().unwrap_or(Currency::Ngn);
    let available = ledger_account
        .credits_posted
        .saturating_sub(ledger_account.debits_posted)
        .saturating_sub(ledger_account.debits_pending);
    WalletView {
        id: wallet.id.clone(),
        name: wallet.currency.to_uppercase(),
        currency: wallet.currency.clone(),
        balance: amount::display_amount(currency, available),
        locked_balance: amount::display_amount(currency, ledger_account.debits_pending),
        deposit_address: None,
        default_network: None,
        networks: Vec::new(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nairex_ledger::{InMemoryLedger, Transfer, TransferFlags};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn setup() -> (WalletService, crate::account::AuthedAccount) {
        let db = Database::in_memory().await.unwrap();
        let ledger: Arc<dyn LedgerClient> = Arc::new(InMemoryLedger::new());
        let accounts = AccountService::new(db.clone(), Arc::clone(&ledger));
        let wallets = WalletService::new(db, Arc::clone(&ledger), accounts.clone());
        wallets.init_system_accounts().await.unwrap();

        let (_, token) = accounts
            .create_account(crate::account::CreateAccount {
                email: "wallet@example.com".into(),
                password: "hunter2hunter2".into(),
                first_name: "Ada".into(),
                last_name: "Obi".into(),
                display_name: "Ada".into(),
            })
            .await
            .unwrap();
        let caller = accounts.resolve_token(&token.token).await.unwrap();
        (wallets, caller)
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let (wallets, _) = setup().await;
        // Second boot observes `exists` for every system account.
        wallets.init_system_accounts().await.unwrap();
    }

    #[tokio::test]
    async fn fresh_wallets_have_zero_balances() {
        let (wallets, caller) = setup().await;
        let views = wallets.fetch_wallets(Scope::AsUser(&caller), "me").await.unwrap();
        assert_eq!(views.len(), Currency::ALL.len());
        for view in views {
            assert_eq!(view.balance, Decimal::ZERO);
            assert_eq!(view.locked_balance, Decimal::ZERO);
        }
    }

    #[tokio::test]
    async fn balances_subtract_pending_holds() {
        let (wallets, caller) = setup().await;
        let view = wallets
            .fetch_wallet(Scope::AsUser(&caller), "me", Currency::Ngn)
            .await
            .unwrap();
        let wallet_id = id::decode_hex(&view.id).unwrap();

        // Credit 100 ngn from the system account, then hold 30.
        let res = wallets
            .ledger
            .create_transfers(vec![Transfer {
                id: id::new_ledger_id(),
                debit_account_id: Currency::Ngn.ledger_index() as u128,
                credit_account_id: wallet_id,
                amount: 100_000_000_000,
                ledger: Currency::Ngn.ledger_index(),
                code: 3,
                ..Default::default()
            }])
            .await
            .unwrap();
        assert!(res.is_empty());
        let res = wallets
            .ledger
            .create_transfers(vec![Transfer {
                id: id::new_ledger_id(),
                debit_account_id: wallet_id,
                credit_account_id: Currency::Ngn.ledger_index() as u128,
                amount: 30_000_000_000,
                ledger: Currency::Ngn.ledger_index(),
                code: 1,
                flags: TransferFlags { pending: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();
        assert!(res.is_empty());

        let view = wallets
            .fetch_wallet(Scope::AsUser(&caller), "me", Currency::Ngn)
            .await
            .unwrap();
        assert_eq!(view.balance, Decimal::from_str("70.00").unwrap());
        assert_eq!(view.locked_balance, Decimal::from_str("30.00").unwrap());
    }

    #[tokio::test]
    async fn unknown_currency_wallet_is_not_found() {
        let (wallets, caller) = setup().await;
        // The wallet rows exist for every supported currency, so a lookup
        // for a wallet of another user fails the scope check instead.
        let err = wallets
            .fetch_wallet(Scope::AsUser(&caller), "00000000-0000-0000-0000-000000000000", Currency::Btc)
            .await
            .unwrap_err();
        assert_eq!(err.kind, nairex_types::ErrorKind::NotFound);
    }
}
