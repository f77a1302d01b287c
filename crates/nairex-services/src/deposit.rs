//! Deposits: inbound credits from a currency's system account.
//!
//! Deposits are not stored relationally; they are derived entirely from
//! code-3 ledger transfers whose credit side is a user wallet. The create
//! path exists for the admin/test flow that models external settlement.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use nairex_db::Database;
use nairex_ledger::{AccountFilter, LedgerClient, Transfer};
use nairex_types::{amount, id, Currency, Error, Result};

use crate::account::{AccountService, AuthedAccount, Scope};
use crate::views::{DepositView, UserView};
use crate::wallet::WalletService;
use crate::webhook::WebhookDispatcher;

const DEPOSIT_TYPE: &str = "coin_address";
const LIST_LIMIT: usize = 8000;

#[derive(Clone)]
pub struct DepositService {
    db: Database,
    ledger: Arc<dyn LedgerClient>,
    accounts: AccountService,
    wallets: WalletService,
    webhooks: WebhookDispatcher,
}

impl DepositService {
    pub fn new(
        db: Database,
        ledger: Arc<dyn LedgerClient>,
        accounts: AccountService,
        wallets: WalletService,
        webhooks: WebhookDispatcher,
    ) -> Self {
        Self { db, ledger, accounts, wallets, webhooks }
    }

    /// Credit `amount` of `currency` into the user's wallet from the
    /// currency's system account.
    pub async fn create(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        currency: Currency,
        requested: Decimal,
    ) -> Result<DepositView> {
        if requested <= Decimal::ZERO {
            return Err(Error::validation("amount must be greater than 0"));
        }
        let user = self.accounts.fetch_account(Scope::AsUser(caller), user_id).await?;
        let wallet = self
            .db
            .wallets()
            .find(&user.id, currency.code())
            .await?
            .ok_or_else(|| Error::not_found("wallet not found"))?;

        let amount_display = amount::approximate(currency, requested);
        let tag = Uuid::parse_str(&user.id).map(id::uuid_to_u128).map_err(Error::fatal)?;
        let tx_id = id::new_ledger_id();
        let results = self
            .ledger
            .create_transfers(vec![Transfer {
                id: tx_id,
                debit_account_id: currency.ledger_index() as u128,
                credit_account_id: id::decode_hex(&wallet.id)?,
                amount: amount::to_ledger_units(amount_display)?,
                ledger: currency.ledger_index(),
                code: 3,
                user_data_128: tag,
                ..Default::default()
            }])
            .await
            .map_err(Error::fatal)?;
        if !results.is_empty() {
            return Err(Error::fatal(format!("posting deposit: {results:?}")));
        }

        info!(user_id = %user.id, currency = %currency, "deposit credited");

        let view = self
            .fetch(Scope::AsUser(caller), user_id, &id::encode_hex(tx_id))
            .await?;
        let webhook = self.accounts.webhook_details_for(&user).await?;
        if let Ok(data) = serde_json::to_value(&view) {
            self.webhooks.enqueue_deposit_success(&webhook, data);
        }
        Ok(view)
    }

    /// Fetch one deposit by its transfer id, verifying the credited wallet
    /// belongs to the requested user.
    pub async fn fetch(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        transaction_id: &str,
    ) -> Result<DepositView> {
        let user = self.accounts.fetch_account(scope, user_id).await?;
        let tx_id = id::decode_hex(transaction_id)?;
        let transfer = self
            .ledger
            .lookup_transfers(vec![tx_id])
            .await
            .map_err(Error::fatal)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("deposit not found"))?;
        if transfer.code != 3 {
            return Err(Error::not_found("deposit not found"));
        }

        let wallet_hex = id::encode_hex(transfer.credit_account_id);
        let wallets = self.wallets.lookup_wallets(std::slice::from_ref(&wallet_hex)).await?;
        let owned = wallets
            .get(&wallet_hex)
            .ok_or_else(|| Error::not_found("deposit not found"))?;
        if owned.owner.id != user.id {
            return Err(Error::not_found("deposit not found"));
        }

        Ok(build_view(&transfer, owned.view.clone(), UserView::from_account(&user))?)
    }

    /// List the user's deposits, newest first. With a currency filter the
    /// scan pins the specific wallet instead of the owner tag.
    pub async fn list(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        currency: Option<Currency>,
    ) -> Result<Vec<DepositView>> {
        let user = self.accounts.fetch_account(scope, user_id).await?;
        let mut filter = AccountFilter {
            user_data_128: Some(
                Uuid::parse_str(&user.id).map(id::uuid_to_u128).map_err(Error::fatal)?,
            ),
            code: Some(3),
            credits: true,
            reversed: true,
            limit: LIST_LIMIT,
            ..Default::default()
        };
        if let Some(currency) = currency {
            let wallet = self
                .db
                .wallets()
                .find(&user.id, currency.code())
                .await?
                .ok_or_else(|| Error::not_found("wallet not found"))?;
            filter.account_id = Some(id::decode_hex(&wallet.id)?);
            filter.user_data_128 = None;
        }

        let transfers = self.ledger.account_transfers(filter).await.map_err(Error::fatal)?;
        let wallet_ids: Vec<String> = transfers
            .iter()
            .map(|t| id::encode_hex(t.credit_account_id))
            .collect();
        let wallets = self.wallets.lookup_wallets(&wallet_ids).await?;

        let user_view = UserView::from_account(&user);
        let mut views = Vec::with_capacity(transfers.len());
        for transfer in transfers {
            let wallet_hex = id::encode_hex(transfer.credit_account_id);
            let Some(owned) = wallets.get(&wallet_hex) else { continue };
            views.push(build_view(&transfer, owned.view.clone(), user_view.clone())?);
        }
        Ok(views)
    }
}

fn build_view(
    transfer: &Transfer,
    wallet: crate::views::WalletView,
    user: UserView,
) -> Result<DepositView> {
    let currency = Currency::from_ledger_index(transfer.ledger)
        .ok_or_else(|| Error::fatal(format!("unknown ledger index {}", transfer.ledger)))?;
    let at = Utc.timestamp_nanos(transfer.timestamp as i64);
    Ok(DepositView {
        id: id::encode_hex(transfer.id),
        deposit_type: DEPOSIT_TYPE.to_string(),
        currency: currency.code().to_string(),
        amount: amount::display_amount(currency, transfer.amount),
        fee: Decimal::ZERO,
        status: "completed".to_string(),
        tx_id: id::encode_hex(transfer.id),
        created_at: at,
        done_at: at,
        wallet,
        user,
    })
}
