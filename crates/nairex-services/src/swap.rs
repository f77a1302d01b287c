//! Instant-swap engine: a two-phase currency exchange with a deadline.
//!
//! Phase one (quote) places a linked pair of pending holds and persists the
//! swap record with FOUR pre-allocated transfer ids: the two pending legs
//! and the two resolution legs. Phase two either posts the pending pair
//! (confirm) or voids it (reversal at the deadline) -- both using the SAME
//! pre-allocated resolution ids, so the ledger's per-pending-id mutual
//! exclusion decides any race: the loser observes
//! `pending_transfer_not_pending` and treats it as benign.
//!
//! Reversal ids are read from the swap record, never re-derived. That is
//! what makes the reversal at-most-once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use nairex_db::{Database, DbAccount, DbInstantSwap};
use nairex_ledger::{CreateTransferCode, LedgerClient, QueryFilter, Transfer, TransferFlags};
use nairex_types::{amount, id, Currency, Error, RateTable, Result};

use crate::account::{AccountService, AuthedAccount, Scope};
use crate::scheduler::Scheduler;
use crate::views::{QuotationView, SwapView, TemporaryQuoteView, UserView};
use crate::wallet::WalletService;
use crate::webhook::{WebhookDetails, WebhookDispatcher, WebhookEvent};

#[derive(Debug, Clone)]
pub struct CreateSwap {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: Decimal,
}

#[derive(Clone)]
pub struct SwapService {
    db: Database,
    ledger: Arc<dyn LedgerClient>,
    accounts: AccountService,
    wallets: WalletService,
    scheduler: Scheduler,
    webhooks: WebhookDispatcher,
    rates: Arc<RateTable>,
    /// How long a quotation's holds live before automatic reversal. The
    /// same window drives status classification on reads.
    pending_ttl: Duration,
}

impl SwapService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        ledger: Arc<dyn LedgerClient>,
        accounts: AccountService,
        wallets: WalletService,
        scheduler: Scheduler,
        webhooks: WebhookDispatcher,
        rates: Arc<RateTable>,
        pending_ttl: Duration,
    ) -> Self {
        Self { db, ledger, accounts, wallets, scheduler, webhooks, rates, pending_ttl }
    }

    fn normalize(&self, from: Currency, to: Currency, requested: Decimal) -> (Decimal, Decimal) {
        let from_amount = amount::approximate(from, requested);
        let to_amount = amount::approximate(to, self.rates.rate(from, to) * from_amount);
        (from_amount, to_amount)
    }

    /// A quote with no ledger effect.
    pub async fn temporary_quote(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        req: CreateSwap,
    ) -> Result<TemporaryQuoteView> {
        self.accounts.fetch_account(Scope::AsUser(caller), user_id).await?;
        let (from_amount, to_amount) =
            self.normalize(req.from_currency, req.to_currency, req.from_amount);
        let quote = self.rates.quoted_price(req.from_currency, req.to_currency);
        Ok(TemporaryQuoteView {
            from_currency: req.from_currency.code().to_string(),
            to_currency: req.to_currency.code().to_string(),
            quoted_price: quote.price,
            quoted_currency: quote.currency.code().to_string(),
            from_amount,
            to_amount,
        })
    }

    /// Create a quotation: persist the swap record and place the linked
    /// pending pair. Schedules the automatic reversal on success.
    pub async fn create_quote(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        req: CreateSwap,
    ) -> Result<QuotationView> {
        if req.from_amount <= Decimal::ZERO {
            return Err(Error::validation("from_amount must be greater than 0"));
        }
        let user = self.accounts.fetch_account(Scope::AsUser(caller), user_id).await?;
        let from_wallet = self.wallets.wallet_for_account(&user, req.from_currency).await?;
        let to_wallet = self.wallets.wallet_for_account(&user, req.to_currency).await?;

        let (from_amount, to_amount) =
            self.normalize(req.from_currency, req.to_currency, req.from_amount);
        if from_wallet.balance < from_amount {
            return Err(Error::failed_dependency("Insufficient Balance"));
        }

        let rate = self.rates.rate(req.from_currency, req.to_currency);
        let rate_scaled = amount::to_ledger_units(rate)? as i64;

        // Every identifier the protocol will ever need is fixed here.
        let swap_ref = id::new_ledger_id() as u64 as u128;
        let quotation_ref = id::new_ledger_id() as u64 as u128;
        let quote_tx = [id::new_ledger_id(), id::new_ledger_id()];
        let swap_tx = [id::new_ledger_id(), id::new_ledger_id()];

        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.pending_ttl).map_err(Error::fatal)?;
        // Advisory expiry stamped on the holds; the authoritative deadline
        // is fixed after the holds commit, so it always lands strictly
        // later than the pending legs' ledger timestamps.
        let timeout_hint = now + ttl;
        let swap = DbInstantSwap {
            id: id::encode_hex(swap_ref),
            quotation_id: id::encode_hex(quotation_ref),
            from_wallet_id: from_wallet.id.clone(),
            to_wallet_id: to_wallet.id.clone(),
            quotation_rate: rate_scaled,
            execution_rate: rate_scaled,
            quote_tx_id_0: id::encode_hex(quote_tx[0]),
            quote_tx_id_1: id::encode_hex(quote_tx[1]),
            swap_tx_id_0: id::encode_hex(swap_tx[0]),
            swap_tx_id_1: id::encode_hex(swap_tx[1]),
            created_at: now,
        };

        let tag = user_tag(&user)?;
        let holds = vec![
            Transfer {
                id: quote_tx[0],
                debit_account_id: id::decode_hex(&from_wallet.id)?,
                credit_account_id: req.from_currency.ledger_index() as u128,
                amount: amount::to_ledger_units(from_amount)?,
                ledger: req.from_currency.ledger_index(),
                code: 1,
                user_data_128: tag,
                user_data_64: id::low_bits(quotation_ref),
                timeout: timeout_hint.timestamp() as u32,
                flags: TransferFlags { linked: true, pending: true, ..Default::default() },
                ..Default::default()
            },
            Transfer {
                id: quote_tx[1],
                debit_account_id: req.to_currency.ledger_index() as u128,
                credit_account_id: id::decode_hex(&to_wallet.id)?,
                amount: amount::to_ledger_units(to_amount)?,
                ledger: req.to_currency.ledger_index(),
                code: 1,
                user_data_128: tag,
                user_data_64: id::low_bits(quotation_ref),
                timeout: timeout_hint.timestamp() as u32,
                flags: TransferFlags { pending: true, ..Default::default() },
                ..Default::default()
            },
        ];

        // Metadata first, inside an open transaction; the ledger call
        // decides whether it commits.
        let mut tx = self.db.begin().await?;
        self.db.swaps().insert(&mut tx, &swap).await?;

        let results = self.ledger.create_transfers(holds).await.map_err(Error::fatal)?;
        if results.iter().any(|r| r.code == CreateTransferCode::ExceedsCredits) {
            return Err(Error::failed_dependency("Insufficient Balance"));
        }
        if !results.is_empty() {
            return Err(Error::fatal(format!("placing swap holds: {results:?}")));
        }
        tx.commit().await.map_err(nairex_db::DbError::from)?;

        info!(
            quotation_id = %swap.quotation_id,
            from = %req.from_currency,
            to = %req.to_currency,
            "swap quotation created"
        );

        let expires_at = Utc::now() + ttl;
        let reversal = self.clone();
        let quotation_key = swap.quotation_id.clone();
        self.scheduler.schedule(swap.quotation_id.clone(), expires_at, async move {
            reversal.run_reversal(&quotation_key).await;
        });

        if let Ok(updated) = self.wallets.wallet_for_account(&user, req.from_currency).await {
            if let Ok(data) = serde_json::to_value(&updated) {
                self.webhooks.enqueue(&caller.webhook, WebhookEvent::WalletUpdated, data);
            }
        }

        let quote = self.rates.quoted_price(req.from_currency, req.to_currency);
        Ok(QuotationView {
            id: swap.quotation_id,
            from_currency: req.from_currency.code().to_string(),
            to_currency: req.to_currency.code().to_string(),
            quoted_price: quote.price,
            quoted_currency: quote.currency.code().to_string(),
            from_amount,
            to_amount,
            confirmed: false,
            expires_at,
            created_at: now,
            user: UserView::from_account(&user),
        })
    }

    /// Confirm a quotation. Cancels the scheduled reversal, dispatches the
    /// posting asynchronously and returns a `pending` view immediately.
    pub async fn confirm(
        &self,
        caller: &AuthedAccount,
        user_id: &str,
        quotation_id: &str,
    ) -> Result<SwapView> {
        let user = self.accounts.fetch_account(Scope::AsUser(caller), user_id).await?;
        let swap = self
            .db
            .swaps()
            .find_by_quotation(quotation_id)
            .await?
            .ok_or_else(|| Error::not_found("swap not found"))?;
        let from_wallet = self
            .db
            .wallets()
            .find_by_id(&swap.from_wallet_id)
            .await?
            .ok_or_else(|| Error::not_found("swap not found"))?;
        if from_wallet.account_id != user.id {
            return Err(Error::validation("invalid user id provided"));
        }

        let pendings = self
            .ledger
            .lookup_transfers(vec![
                id::decode_hex(&swap.quote_tx_id_0)?,
                id::decode_hex(&swap.quote_tx_id_1)?,
            ])
            .await
            .map_err(Error::fatal)?;
        if pendings.len() != 2 {
            return Err(Error::failed_dependency("transaction not found"));
        }

        // Cancel-on-confirm. Losing this race is harmless: post and void
        // target the same resolution ids and only one can win.
        self.scheduler.cancel(quotation_id);

        let webhook = self.accounts.webhook_details_for(&user).await?;
        let processor = self.clone();
        let task_swap = swap.clone();
        let task_user = user.clone();
        tokio::spawn(async move {
            processor.process_swap(task_swap, task_user, webhook).await;
        });

        let view =
            self.build_swap_view(&swap, &pendings[0], &pendings[1], "pending", true, &user)?;
        Ok(view)
    }

    /// Single-pass posting of the confirmed pair.
    async fn process_swap(&self, swap: DbInstantSwap, user: DbAccount, webhook: WebhookDetails) {
        if let Err(err) = self.process_swap_inner(&swap, &user, &webhook).await {
            error!(swap_id = %swap.id, error = %err, "processing swap confirmation");
        }
    }

    async fn process_swap_inner(
        &self,
        swap: &DbInstantSwap,
        user: &DbAccount,
        webhook: &WebhookDetails,
    ) -> Result<()> {
        let quote_ids =
            [id::decode_hex(&swap.quote_tx_id_0)?, id::decode_hex(&swap.quote_tx_id_1)?];
        let pendings = self
            .ledger
            .lookup_transfers(quote_ids.to_vec())
            .await
            .map_err(Error::fatal)?;
        if pendings.len() != 2 {
            return Err(Error::failed_dependency("transaction not found"));
        }
        let tag = user_tag(user)?;
        let swap_ref = id::decode_hex(&swap.id)?;

        let posts = resolution_pair(
            [id::decode_hex(&swap.swap_tx_id_0)?, id::decode_hex(&swap.swap_tx_id_1)?],
            quote_ids,
            tag,
            id::low_bits(swap_ref),
            false,
        );
        let results = self.ledger.create_transfers(posts).await.map_err(Error::fatal)?;

        if results.is_empty() {
            info!(swap_id = %swap.id, "swap confirmed");
            let view =
                self.build_swap_view(swap, &pendings[0], &pendings[1], "confirmed", true, user)?;
            if let Ok(data) = serde_json::to_value(&view) {
                self.webhooks.enqueue(webhook, WebhookEvent::SwapTransactionCompleted, data);
            }
            return Ok(());
        }

        if results.iter().any(|r| r.code == CreateTransferCode::ExceedsCredits) {
            // Liquidity refused the posting: release the holds instead.
            let voids = resolution_pair(
                [id::decode_hex(&swap.swap_tx_id_0)?, id::decode_hex(&swap.swap_tx_id_1)?],
                quote_ids,
                tag,
                id::low_bits(swap_ref),
                true,
            );
            let void_results =
                self.ledger.create_transfers(voids).await.map_err(Error::fatal)?;
            for result in &void_results {
                if !result.code.is_benign_replay()
                    && result.code != CreateTransferCode::LinkedEventFailed
                {
                    error!(swap_id = %swap.id, code = ?result.code, "voiding failed swap");
                }
            }
            let view =
                self.build_swap_view(swap, &pendings[0], &pendings[1], "failed", false, user)?;
            if let Ok(data) = serde_json::to_value(&view) {
                self.webhooks.enqueue(webhook, WebhookEvent::SwapTransactionFailed, data);
            }
            return Ok(());
        }

        if results
            .iter()
            .all(|r| r.code.is_benign_replay() || r.code == CreateTransferCode::LinkedEventFailed)
        {
            // A reversal already resolved the pair; whatever it decided
            // stands.
            info!(swap_id = %swap.id, "swap already resolved, confirmation is a no-op");
            return Ok(());
        }

        error!(swap_id = %swap.id, results = ?results, "unexpected result posting swap");
        Ok(())
    }

    /// Fired by the scheduler at the quotation deadline (unless confirm
    /// cancelled it first). All failures are logged, never surfaced: there
    /// is no caller to surface them to.
    pub async fn run_reversal(&self, quotation_id: &str) {
        info!(quotation_id, "attempting to reverse instant swap transfer...");
        if let Err(err) = self.run_reversal_inner(quotation_id).await {
            error!(quotation_id, error = %err, "reversing instant swap");
        }
    }

    async fn run_reversal_inner(&self, quotation_id: &str) -> Result<()> {
        let swap = self
            .db
            .swaps()
            .find_by_quotation(quotation_id)
            .await?
            .ok_or_else(|| Error::not_found("swap not found"))?;
        let wallet = self
            .db
            .wallets()
            .find_by_id(&swap.from_wallet_id)
            .await?
            .ok_or_else(|| Error::not_found("wallet not found"))?;
        let user = self.accounts.fetch_account(Scope::Internal, &wallet.account_id).await?;
        let webhook = self.accounts.webhook_details_for(&user).await?;

        let quote_ids =
            [id::decode_hex(&swap.quote_tx_id_0)?, id::decode_hex(&swap.quote_tx_id_1)?];
        let pendings = self
            .ledger
            .lookup_transfers(quote_ids.to_vec())
            .await
            .map_err(Error::fatal)?;
        if pendings.len() != 2 {
            return Err(Error::failed_dependency("transaction not found"));
        }

        let voids = resolution_pair(
            [id::decode_hex(&swap.swap_tx_id_0)?, id::decode_hex(&swap.swap_tx_id_1)?],
            quote_ids,
            user_tag(&user)?,
            id::low_bits(id::decode_hex(&swap.id)?),
            true,
        );
        let results = self.ledger.create_transfers(voids).await.map_err(Error::fatal)?;
        if !results.is_empty() {
            // The confirm path won the race; its post already resolved the
            // pending pair.
            for result in &results {
                if !result.code.is_benign_replay()
                    && result.code != CreateTransferCode::LinkedEventFailed
                {
                    error!(quotation_id, code = ?result.code, "reversing pending transactions");
                }
            }
            return Ok(());
        }

        info!(quotation_id, "swap reversed");
        let view =
            self.build_swap_view(&swap, &pendings[0], &pendings[1], "reversed", false, &user)?;
        if let Ok(data) = serde_json::to_value(&view) {
            self.webhooks.enqueue(&webhook, WebhookEvent::SwapTransactionReversed, data);
        }
        Ok(())
    }

    /// Fetch one swap transaction by id, classifying its status from
    /// ledger state only.
    pub async fn fetch_swap(
        &self,
        scope: Scope<'_>,
        user_id: &str,
        swap_tx_id: &str,
    ) -> Result<SwapView> {
        let user = self.accounts.fetch_account(scope, user_id).await?;
        let swap_ref = id::decode_hex(swap_tx_id)?;
        let resolutions = self
            .ledger
            .query_transfers(QueryFilter {
                user_data_128: Some(user_tag(&user)?),
                user_data_64: Some(id::low_bits(swap_ref)),
                code: Some(1),
                reversed: true,
                limit: 9000,
                ..Default::default()
            })
            .await
            .map_err(Error::fatal)?;
        let pending_ids: Vec<u128> = resolutions.iter().map(|t| t.pending_id).collect();
        let pendings = self
            .ledger
            .lookup_transfers(pending_ids)
            .await
            .map_err(Error::fatal)?;
        if resolutions.len() + pendings.len() < 4 {
            return Err(Error::not_found("swap not found"));
        }

        let mut combined = resolutions;
        combined.extend(pendings);
        self.group_transactions(combined, &user)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("swap not found"))
    }

    /// List the user's resolved swap transactions, newest first.
    pub async fn list_swaps(&self, scope: Scope<'_>, user_id: &str) -> Result<Vec<SwapView>> {
        let user = self.accounts.fetch_account(scope, user_id).await?;
        let transfers = self
            .ledger
            .query_transfers(QueryFilter {
                user_data_128: Some(user_tag(&user)?),
                code: Some(1),
                reversed: true,
                limit: 9000,
                ..Default::default()
            })
            .await
            .map_err(Error::fatal)?;
        self.group_transactions(transfers, &user).await
    }

    /// Pair resolution legs by their shared tag, attach their pending
    /// predecessors and classify:
    ///
    /// - leg0 carries `post_pending_transfer`  -> confirmed
    /// - leg0 landed after the quote's deadline -> reversed
    /// - otherwise                              -> failed
    async fn group_transactions(
        &self,
        transfers: Vec<Transfer>,
        user: &DbAccount,
    ) -> Result<Vec<SwapView>> {
        let mut pending_by_id: HashMap<u128, Transfer> = HashMap::new();
        let mut groups: HashMap<u64, [Option<Transfer>; 2]> = HashMap::new();
        let mut order: Vec<u64> = Vec::new();

        for transfer in transfers {
            if transfer.flags.pending {
                pending_by_id.insert(transfer.id, transfer);
            } else if transfer.flags.post_pending_transfer || transfer.flags.void_pending_transfer
            {
                let entry = groups.entry(transfer.user_data_64).or_insert_with(|| {
                    order.push(transfer.user_data_64);
                    [None, None]
                });
                // The from-leg credits the currency's system account, whose
                // id equals the ledger index.
                let slot = usize::from(transfer.credit_account_id != transfer.ledger as u128);
                entry[slot] = Some(transfer);
            }
        }

        // Pending legs missing from the scan (e.g. the fetch-by-id path)
        // are read back by their stored ids.
        let missing: Vec<u128> = groups
            .values()
            .flatten()
            .flatten()
            .map(|t| t.pending_id)
            .filter(|pending_id| !pending_by_id.contains_key(pending_id))
            .collect();
        if !missing.is_empty() {
            for pending in
                self.ledger.lookup_transfers(missing).await.map_err(Error::fatal)?
            {
                pending_by_id.insert(pending.id, pending);
            }
        }

        let ttl_nanos = self.pending_ttl.as_nanos() as u64;
        let mut views = Vec::new();
        for key in order {
            let [Some(leg0), Some(leg1)] = groups[&key] else { continue };
            let (Some(quote0), Some(quote1)) =
                (pending_by_id.get(&leg0.pending_id), pending_by_id.get(&leg1.pending_id))
            else {
                continue;
            };

            let status = if leg0.flags.post_pending_transfer {
                "confirmed"
            } else if leg0.timestamp > quote0.timestamp.saturating_add(ttl_nanos) {
                "reversed"
            } else {
                "failed"
            };

            let swap_row = self
                .db
                .swaps()
                .find_by_quotation(&id::encode_hex(quote0.user_data_64 as u128))
                .await?;
            let view = self.build_grouped_view(
                swap_row.as_ref(),
                &leg0,
                &leg1,
                quote0,
                quote1,
                status,
                user,
            )?;
            views.push(view);
        }
        Ok(views)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_grouped_view(
        &self,
        swap_row: Option<&DbInstantSwap>,
        leg0: &Transfer,
        leg1: &Transfer,
        quote0: &Transfer,
        quote1: &Transfer,
        status: &str,
        user: &DbAccount,
    ) -> Result<SwapView> {
        let from = currency_of(leg0.ledger)?;
        let to = currency_of(leg1.ledger)?;
        let rate = swap_row
            .map(|row| rate_from_scaled(row.execution_rate))
            .unwrap_or_else(|| self.rates.rate(from, to));
        let (quoted_price, quoted_currency) = quoted_from_rate(from, to, rate);

        let resolved_at = nanos_to_datetime(leg0.timestamp);
        let quoted_at = nanos_to_datetime(quote0.timestamp);
        let expires_at = quoted_at
            + chrono::Duration::from_std(self.pending_ttl).map_err(Error::fatal)?;
        let user_view = UserView::from_account(user);

        Ok(SwapView {
            id: id::encode_hex(leg0.user_data_64 as u128),
            from_currency: from.code().to_string(),
            to_currency: to.code().to_string(),
            from_amount: amount::display_amount(from, leg0.amount),
            received_amount: amount::display_amount(to, leg1.amount),
            execution_price: quoted_price,
            status: status.to_string(),
            created_at: resolved_at,
            updated_at: resolved_at,
            swap_quotation: QuotationView {
                id: id::encode_hex(quote0.user_data_64 as u128),
                from_currency: from.code().to_string(),
                to_currency: to.code().to_string(),
                quoted_price,
                quoted_currency: quoted_currency.code().to_string(),
                from_amount: amount::display_amount(from, quote0.amount),
                to_amount: amount::display_amount(to, quote1.amount),
                confirmed: status == "confirmed",
                expires_at,
                created_at: quoted_at,
                user: user_view.clone(),
            },
            user: user_view,
        })
    }

    /// The view returned from confirm and used for webhook payloads, built
    /// from the swap record and its pending legs.
    fn build_swap_view(
        &self,
        swap: &DbInstantSwap,
        quote0: &Transfer,
        quote1: &Transfer,
        status: &str,
        confirmed: bool,
        user: &DbAccount,
    ) -> Result<SwapView> {
        let from = currency_of(quote0.ledger)?;
        let to = currency_of(quote1.ledger)?;
        let rate = rate_from_scaled(swap.execution_rate);
        let (quoted_price, quoted_currency) = quoted_from_rate(from, to, rate);
        let now = Utc::now();
        let expires_at = swap.created_at
            + chrono::Duration::from_std(self.pending_ttl).map_err(Error::fatal)?;
        let user_view = UserView::from_account(user);

        Ok(SwapView {
            id: swap.id.clone(),
            from_currency: from.code().to_string(),
            to_currency: to.code().to_string(),
            from_amount: amount::display_amount(from, quote0.amount),
            received_amount: amount::display_amount(to, quote1.amount),
            execution_price: quoted_price,
            status: status.to_string(),
            created_at: swap.created_at,
            updated_at: now,
            swap_quotation: QuotationView {
                id: swap.quotation_id.clone(),
                from_currency: from.code().to_string(),
                to_currency: to.code().to_string(),
                quoted_price,
                quoted_currency: quoted_currency.code().to_string(),
                from_amount: amount::display_amount(from, quote0.amount),
                to_amount: amount::display_amount(to, quote1.amount),
                confirmed,
                expires_at,
                created_at: swap.created_at,
                user: user_view.clone(),
            },
            user: user_view,
        })
    }
}

/// The post/void pair over the stored resolution ids. `amount` stays zero
/// so the engine inherits the full pending amounts.
fn resolution_pair(
    resolution_ids: [u128; 2],
    pending_ids: [u128; 2],
    tag: u128,
    group: u64,
    void: bool,
) -> Vec<Transfer> {
    let flags = |linked: bool| TransferFlags {
        linked,
        post_pending_transfer: !void,
        void_pending_transfer: void,
        ..Default::default()
    };
    vec![
        Transfer {
            id: resolution_ids[0],
            pending_id: pending_ids[0],
            user_data_128: tag,
            user_data_64: group,
            code: 1,
            flags: flags(true),
            ..Default::default()
        },
        Transfer {
            id: resolution_ids[1],
            pending_id: pending_ids[1],
            user_data_128: tag,
            user_data_64: group,
            code: 1,
            flags: flags(false),
            ..Default::default()
        },
    ]
}

fn user_tag(user: &DbAccount) -> Result<u128> {
    Uuid::parse_str(&user.id).map(id::uuid_to_u128).map_err(Error::fatal)
}

fn currency_of(ledger: u32) -> Result<Currency> {
    Currency::from_ledger_index(ledger)
        .ok_or_else(|| Error::fatal(format!("unknown ledger index {ledger}")))
}

fn rate_from_scaled(scaled: i64) -> Decimal {
    Decimal::try_from_i128_with_scale(scaled as i128, 9).unwrap_or(Decimal::ZERO)
}

fn quoted_from_rate(from: Currency, to: Currency, rate: Decimal) -> (Decimal, Currency) {
    if from == Currency::Ngn && rate > Decimal::ZERO {
        (amount::approximate(Currency::Ngn, Decimal::ONE / rate), Currency::Ngn)
    } else {
        (amount::approximate(to, rate), to)
    }
}

fn nanos_to_datetime(nanos: u64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos as i64)
}
