//! Internal withdrawals: peer-to-peer transfers with recipient metadata.
//!
//! The metadata row is written inside an open transaction and the single
//! ledger posting decides whether it commits. Status is `completed` exactly
//! when the ledger transfer exists and is posted; there is no intermediate
//! state for internal transfers.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use nairex_db::{Database, DbAccount, DbWithdrawal, WithdrawalKey};
use nairex_ledger::{CreateTransferCode, LedgerClient, Transfer};
use nairex_types::{amount, id, Currency, Error, Result};

use crate::account::{AccountService, AuthedAccount, Scope};
use crate::views::{RecipientDetailsView, RecipientView, UserView, WithdrawalView};
use crate::wallet::WalletService;
use crate::webhook::{WebhookDispatcher, WebhookEvent};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

const RECIPIENT_INTERNAL: &str = "internal";

#[derive(Debug, Clone)]
pub struct CreateWithdrawal {
    /// Recipient account id.
    pub fund_uid: String,
    pub currency: Currency,
    pub amount: Decimal,
    pub transaction_note: String,
    pub narration: String,
}

#[derive(Clone)]
pub struct WithdrawalService {
    db: Database,
    ledger: Arc<dyn LedgerClient>,
    accounts: AccountService,
    wallets: WalletService,
    webhooks: WebhookDispatcher,
}

impl WithdrawalService {
    pub fn new(
        db: Database,
        ledger: Arc<dyn LedgerClient>,
        accounts: AccountService,
        wallets: WalletService,
        webhooks: WebhookDispatcher,
    ) -> Self {
        Self { db, ledger, accounts, wallets, webhooks }
    }

    pub async fn create(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        req: CreateWithdrawal,
    ) -> Result<WithdrawalView> {
        if req.amount <= Decimal::ZERO {
            return Err(Error::validation("amount must be greater than 0"));
        }
        let amount_display = amount::approximate(req.currency, req.amount);

        let sender = self.accounts.fetch_account(Scope::AsUser(caller), user_id).await?;
        let sender_wallet = self
            .db
            .wallets()
            .find(&sender.id, req.currency.code())
            .await?
            .ok_or_else(|| Error::not_found("wallet not found"))?;

        // The recipient is any account in the system, so the lookup runs
        // with internal authority.
        let recipient = self.accounts.fetch_account(Scope::Internal, &req.fund_uid).await?;
        let recipient_wallet = self
            .db
            .wallets()
            .find(&recipient.id, req.currency.code())
            .await?
            .ok_or_else(|| Error::not_found("recipient wallet not found"))?;

        let tx_id = id::new_ledger_id();
        let withdrawal = DbWithdrawal {
            id: Uuid::new_v4().to_string(),
            wallet_id: sender_wallet.id.clone(),
            // reference == transfer id for all internal withdrawals
            reference: id::encode_hex(tx_id),
            tx_id: id::encode_hex(tx_id),
            transaction_note: req.transaction_note,
            narration: req.narration,
            status: STATUS_COMPLETED.to_string(),
            recipient_type: RECIPIENT_INTERNAL.to_string(),
            recipient_name: Some(recipient.first_name.clone()),
            recipient_destination_tag: Some(recipient.id.clone()),
            recipient_address: None,
            created_at: Utc::now(),
        };

        let mut tx = self.db.begin().await?;
        self.db.withdrawals().insert(&mut tx, &withdrawal).await?;

        let tag = Uuid::parse_str(&sender.id).map(id::uuid_to_u128).map_err(Error::fatal)?;
        let results = self
            .ledger
            .create_transfers(vec![Transfer {
                id: tx_id,
                debit_account_id: id::decode_hex(&sender_wallet.id)?,
                credit_account_id: id::decode_hex(&recipient_wallet.id)?,
                amount: amount::to_ledger_units(amount_display)?,
                ledger: req.currency.ledger_index(),
                code: 2,
                user_data_128: tag,
                ..Default::default()
            }])
            .await
            .map_err(Error::fatal)?;
        if results.iter().any(|r| r.code == CreateTransferCode::ExceedsCredits) {
            return Err(Error::failed_dependency("Insufficient Balance"));
        }
        if !results.is_empty() {
            return Err(Error::fatal(format!("posting withdrawal: {results:?}")));
        }
        tx.commit().await.map_err(nairex_db::DbError::from)?;

        info!(
            withdrawal_id = %withdrawal.id,
            currency = %req.currency,
            recipient = %recipient.id,
            "withdrawal completed"
        );

        let wallet_view = self.wallets.wallet_for_account(&sender, req.currency).await?;
        let view = WithdrawalView {
            id: withdrawal.id.clone(),
            reference: withdrawal.reference.clone(),
            withdrawal_type: RECIPIENT_INTERNAL.to_string(),
            currency: req.currency.code().to_string(),
            amount: amount_display,
            fee: Decimal::ZERO,
            total: amount_display,
            transaction_id: withdrawal.tx_id.clone(),
            transaction_note: withdrawal.transaction_note.clone(),
            narration: withdrawal.narration.clone(),
            status: withdrawal.status.clone(),
            reason: None,
            created_at: withdrawal.created_at,
            done_at: withdrawal.created_at,
            recipient: recipient_view(&withdrawal),
            wallet: Some(wallet_view),
            user: UserView::from_account(&sender),
        };

        if let Ok(data) = serde_json::to_value(&view) {
            self.webhooks.enqueue(&caller.webhook, WebhookEvent::WithdrawSuccessful, data);
        }
        Ok(view)
    }

    pub async fn fetch(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        key: WithdrawalKey<'_>,
    ) -> Result<WithdrawalView> {
        let viewer = self.accounts.fetch_account(scope, user_id).await?;
        let row = self
            .db
            .withdrawals()
            .find_for_account(&viewer.id, key)
            .await?
            .ok_or_else(|| Error::not_found("withdrawal not found"))?;
        let mut views = self.populate(vec![row], &viewer).await?;
        views.pop().ok_or_else(|| Error::not_found("withdrawal not found"))
    }

    pub async fn list(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        currency: Option<Currency>,
        state: Option<&str>,
    ) -> Result<Vec<WithdrawalView>> {
        let viewer = self.accounts.fetch_account(scope, user_id).await?;
        let rows = self
            .db
            .withdrawals()
            .list_for_account(&viewer.id, currency.map(|c| c.code()), state)
            .await?;
        self.populate(rows, &viewer).await
    }

    /// Join rows to their ledger transfers and wallets, then apply the
    /// counterparty-visibility rule: full user + wallet for the sender, the
    /// sender's parent and siblings under the same parent; stripped user
    /// and no wallet for anyone else.
    async fn populate(
        &self,
        rows: Vec<DbWithdrawal>,
        viewer: &DbAccount,
    ) -> Result<Vec<WithdrawalView>> {
        let wallet_ids: Vec<String> = rows.iter().map(|r| r.wallet_id.clone()).collect();
        let transfer_ids: Vec<u128> = rows
            .iter()
            .map(|r| id::decode_hex(&r.tx_id))
            .collect::<Result<_>>()?;

        let wallets = self.wallets.lookup_wallets(&wallet_ids).await?;
        let transfers = self
            .ledger
            .lookup_transfers(transfer_ids)
            .await
            .map_err(Error::fatal)?;
        let transfers: std::collections::HashMap<String, _> =
            transfers.into_iter().map(|t| (id::encode_hex(t.id), t)).collect();

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(transfer) = transfers.get(&row.tx_id) else { continue };
            if transfer.code != 2 {
                return Err(Error::fatal(format!(
                    "transfer {} is not a withdrawal posting",
                    row.tx_id
                )));
            }
            let Some(owned) = wallets.get(&row.wallet_id) else { continue };

            let currency = currency_of(transfer.ledger)?;
            let amount_display = amount::display_amount(currency, transfer.amount);
            let created_at = Utc.timestamp_nanos(transfer.timestamp as i64);

            let sender = &owned.owner;
            let related = sender.id == viewer.id
                || sender.parent_id.as_deref() == Some(viewer.id.as_str())
                || (sender.parent_id.is_some() && sender.parent_id == viewer.parent_id);
            let (user, wallet) = if related {
                (UserView::from_account(sender), Some(owned.view.clone()))
            } else {
                (UserView::stripped(sender), None)
            };

            views.push(WithdrawalView {
                id: row.id.clone(),
                reference: row.reference.clone(),
                withdrawal_type: row.recipient_type.clone(),
                currency: currency.code().to_string(),
                amount: amount_display,
                fee: Decimal::ZERO,
                total: amount_display,
                transaction_id: row.tx_id.clone(),
                transaction_note: row.transaction_note.clone(),
                narration: row.narration.clone(),
                status: row.status.clone(),
                reason: None,
                created_at,
                done_at: created_at,
                recipient: recipient_view(&row),
                wallet,
                user,
            });
        }
        Ok(views)
    }
}

fn recipient_view(row: &DbWithdrawal) -> RecipientView {
    RecipientView {
        recipient_type: row.recipient_type.clone(),
        details: RecipientDetailsView {
            name: row.recipient_name.clone(),
            destination_tag: row.recipient_destination_tag.clone(),
            address: row.recipient_address.clone(),
        },
    }
}

fn currency_of(ledger: u32) -> Result<Currency> {
    Currency::from_ledger_index(ledger)
        .ok_or_else(|| Error::fatal(format!("unknown ledger index {ledger}")))
}
