//! Reference in-process implementation of the ledger engine.
//!
//! State is guarded by a single async mutex; every batch is evaluated
//! against a scratch copy of the state per linked chain, so a failing chain
//! leaves no trace. This mirrors the external engine's contract closely
//! enough that the orchestration layer cannot tell the difference.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::client::{LedgerClient, LedgerError};
use crate::types::{
    Account, AccountFilter, CreateAccountCode, CreateAccountsResult, CreateTransferCode,
    CreateTransfersResult, QueryFilter, Transfer,
};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<u128, Account>,
    transfers: HashMap<u128, Transfer>,
    /// pending transfer id -> resolving transfer id
    resolved: HashMap<u128, u128>,
    /// transfer ids in commit order
    log: Vec<u128>,
    clock: u64,
}

impl State {
    fn next_timestamp(&mut self) -> u64 {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64;
        self.clock = std::cmp::max(self.clock + 1, now);
        self.clock
    }
}

/// In-process double-entry engine.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Split a batch into linked chains. Each chain is a maximal run of events
/// whose `linked` flag chains them to the next event; the flag on the
/// returned pair marks a chain the final event left open.
fn chains(linked: &[bool]) -> Vec<(Vec<usize>, bool)> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, &links_next) in linked.iter().enumerate() {
        current.push(i);
        if !links_next {
            out.push((std::mem::take(&mut current), false));
        }
    }
    if !current.is_empty() {
        out.push((current, true));
    }
    out
}

fn stage_account(state: &mut State, account: &Account) -> Option<CreateAccountCode> {
    if account.id == 0 {
        return Some(CreateAccountCode::IdMustNotBeZero);
    }
    if account.ledger == 0 {
        return Some(CreateAccountCode::LedgerMustNotBeZero);
    }
    if account.code == 0 {
        return Some(CreateAccountCode::CodeMustNotBeZero);
    }
    if let Some(existing) = state.accounts.get(&account.id) {
        let mut requested = account.flags;
        requested.linked = false;
        let mut present = existing.flags;
        present.linked = false;
        return Some(if present != requested {
            CreateAccountCode::ExistsWithDifferentFlags
        } else if existing.ledger != account.ledger {
            CreateAccountCode::ExistsWithDifferentLedger
        } else if existing.code != account.code {
            CreateAccountCode::ExistsWithDifferentCode
        } else if existing.user_data_128 != account.user_data_128 {
            CreateAccountCode::ExistsWithDifferentUserData
        } else {
            CreateAccountCode::Exists
        });
    }

    let mut stored = *account;
    stored.flags.linked = false;
    stored.debits_pending = 0;
    stored.debits_posted = 0;
    stored.credits_pending = 0;
    stored.credits_posted = 0;
    stored.timestamp = state.next_timestamp();
    state.accounts.insert(stored.id, stored);
    None
}

fn stage_transfer(state: &mut State, transfer: &Transfer) -> Option<CreateTransferCode> {
    if transfer.id == 0 {
        return Some(CreateTransferCode::IdMustNotBeZero);
    }
    if state.transfers.contains_key(&transfer.id) {
        return Some(CreateTransferCode::Exists);
    }
    let flags = transfer.flags;
    let exclusive = [flags.pending, flags.post_pending_transfer, flags.void_pending_transfer];
    if exclusive.iter().filter(|f| **f).count() > 1 {
        return Some(CreateTransferCode::FlagsAreMutuallyExclusive);
    }

    if flags.post_pending_transfer || flags.void_pending_transfer {
        stage_resolution(state, transfer)
    } else {
        stage_posting(state, transfer)
    }
}

/// A plain or pending transfer: both legs exist on the same ledger and the
/// debit side respects its balance cap before anything is applied.
fn stage_posting(state: &mut State, transfer: &Transfer) -> Option<CreateTransferCode> {
    if transfer.amount == 0 {
        return Some(CreateTransferCode::AmountMustNotBeZero);
    }
    if transfer.debit_account_id == transfer.credit_account_id {
        return Some(CreateTransferCode::AccountsMustBeDifferent);
    }
    let Some(debit) = state.accounts.get(&transfer.debit_account_id) else {
        return Some(CreateTransferCode::DebitAccountNotFound);
    };
    let Some(credit) = state.accounts.get(&transfer.credit_account_id) else {
        return Some(CreateTransferCode::CreditAccountNotFound);
    };
    if transfer.ledger != debit.ledger || transfer.ledger != credit.ledger {
        return Some(CreateTransferCode::AccountsMustHaveTheSameLedger);
    }
    if debit.flags.debits_must_not_exceed_credits {
        let reserved = debit
            .debits_posted
            .saturating_add(debit.debits_pending)
            .saturating_add(transfer.amount);
        if reserved > debit.credits_posted {
            return Some(CreateTransferCode::ExceedsCredits);
        }
    }

    let debit_id = transfer.debit_account_id;
    let credit_id = transfer.credit_account_id;
    if transfer.flags.pending {
        let debit = state.accounts.get_mut(&debit_id).unwrap();
        debit.debits_pending += transfer.amount;
        let credit = state.accounts.get_mut(&credit_id).unwrap();
        credit.credits_pending += transfer.amount;
    } else {
        let debit = state.accounts.get_mut(&debit_id).unwrap();
        debit.debits_posted += transfer.amount;
        let credit = state.accounts.get_mut(&credit_id).unwrap();
        credit.credits_posted += transfer.amount;
    }

    let mut stored = *transfer;
    stored.flags.linked = false;
    stored.timestamp = state.next_timestamp();
    state.transfers.insert(stored.id, stored);
    state.log.push(stored.id);
    None
}

/// Post or void a pending transfer. Exactly one resolution can ever win;
/// the second observes `PendingTransferNotPending`.
fn stage_resolution(state: &mut State, transfer: &Transfer) -> Option<CreateTransferCode> {
    if transfer.pending_id == 0 {
        return Some(CreateTransferCode::PendingIdMustNotBeZero);
    }
    let Some(pending) = state.transfers.get(&transfer.pending_id).copied() else {
        return Some(CreateTransferCode::PendingTransferNotFound);
    };
    if !pending.flags.pending || state.resolved.contains_key(&pending.id) {
        return Some(CreateTransferCode::PendingTransferNotPending);
    }
    let amount = if transfer.amount == 0 { pending.amount } else { transfer.amount };
    if amount > pending.amount {
        return Some(CreateTransferCode::ExceedsPendingTransferAmount);
    }

    {
        let debit = state.accounts.get_mut(&pending.debit_account_id).unwrap();
        debit.debits_pending = debit.debits_pending.saturating_sub(pending.amount);
        if transfer.flags.post_pending_transfer {
            debit.debits_posted += amount;
        }
    }
    {
        let credit = state.accounts.get_mut(&pending.credit_account_id).unwrap();
        credit.credits_pending = credit.credits_pending.saturating_sub(pending.amount);
        if transfer.flags.post_pending_transfer {
            credit.credits_posted += amount;
        }
    }

    let mut stored = *transfer;
    stored.flags.linked = false;
    stored.debit_account_id = pending.debit_account_id;
    stored.credit_account_id = pending.credit_account_id;
    stored.ledger = pending.ledger;
    stored.amount = amount;
    stored.timestamp = state.next_timestamp();
    state.resolved.insert(pending.id, stored.id);
    state.transfers.insert(stored.id, stored);
    state.log.push(stored.id);
    None
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_accounts(
        &self,
        accounts: Vec<Account>,
    ) -> Result<Vec<CreateAccountsResult>, LedgerError> {
        let mut state = self.state.lock().await;
        let linked: Vec<bool> = accounts.iter().map(|a| a.flags.linked).collect();
        let mut results = Vec::new();

        for (chain, open) in chains(&linked) {
            if open {
                results.extend(chain.into_iter().map(|index| CreateAccountsResult {
                    index,
                    code: CreateAccountCode::LinkedEventChainOpen,
                }));
                continue;
            }
            let mut scratch = state.clone();
            let mut failures: HashMap<usize, CreateAccountCode> = HashMap::new();
            for &i in &chain {
                if let Some(code) = stage_account(&mut scratch, &accounts[i]) {
                    failures.insert(i, code);
                }
            }
            if failures.is_empty() {
                *state = scratch;
            } else if chain.len() == 1 {
                let index = chain[0];
                results.push(CreateAccountsResult { index, code: failures[&index] });
            } else {
                for &i in &chain {
                    let code = failures
                        .get(&i)
                        .copied()
                        .unwrap_or(CreateAccountCode::LinkedEventFailed);
                    results.push(CreateAccountsResult { index: i, code });
                }
            }
        }
        Ok(results)
    }

    async fn create_transfers(
        &self,
        transfers: Vec<Transfer>,
    ) -> Result<Vec<CreateTransfersResult>, LedgerError> {
        let mut state = self.state.lock().await;
        let linked: Vec<bool> = transfers.iter().map(|t| t.flags.linked).collect();
        let mut results = Vec::new();

        for (chain, open) in chains(&linked) {
            if open {
                results.extend(chain.into_iter().map(|index| CreateTransfersResult {
                    index,
                    code: CreateTransferCode::LinkedEventChainOpen,
                }));
                continue;
            }
            let mut scratch = state.clone();
            let mut failures: HashMap<usize, CreateTransferCode> = HashMap::new();
            for &i in &chain {
                if let Some(code) = stage_transfer(&mut scratch, &transfers[i]) {
                    failures.insert(i, code);
                }
            }
            if failures.is_empty() {
                *state = scratch;
            } else if chain.len() == 1 {
                let index = chain[0];
                results.push(CreateTransfersResult { index, code: failures[&index] });
            } else {
                for &i in &chain {
                    let code = failures
                        .get(&i)
                        .copied()
                        .unwrap_or(CreateTransferCode::LinkedEventFailed);
                    results.push(CreateTransfersResult { index: i, code });
                }
            }
        }
        Ok(results)
    }

    async fn lookup_accounts(&self, ids: Vec<u128>) -> Result<Vec<Account>, LedgerError> {
        let state = self.state.lock().await;
        Ok(ids.iter().filter_map(|id| state.accounts.get(id).copied()).collect())
    }

    async fn lookup_transfers(&self, ids: Vec<u128>) -> Result<Vec<Transfer>, LedgerError> {
        let state = self.state.lock().await;
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| state.transfers.get(id).copied())
            .collect())
    }

    async fn query_transfers(&self, filter: QueryFilter) -> Result<Vec<Transfer>, LedgerError> {
        let state = self.state.lock().await;
        let mut matches: Vec<Transfer> = state
            .log
            .iter()
            .filter_map(|id| state.transfers.get(id).copied())
            .filter(|t| filter.user_data_128.map_or(true, |v| t.user_data_128 == v))
            .filter(|t| filter.user_data_64.map_or(true, |v| t.user_data_64 == v))
            .filter(|t| filter.ledger.map_or(true, |v| t.ledger == v))
            .filter(|t| filter.code.map_or(true, |v| t.code == v))
            .collect();
        if filter.reversed {
            matches.reverse();
        }
        if filter.limit > 0 {
            matches.truncate(filter.limit);
        }
        Ok(matches)
    }

    async fn account_transfers(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let state = self.state.lock().await;
        let side_matches = |t: &Transfer| -> bool {
            let Some(account) = filter.account_id else {
                // No account pinned; fall back to the user-data tag alone.
                return true;
            };
            let credit_hit = t.credit_account_id == account;
            let debit_hit = t.debit_account_id == account;
            match (filter.credits, filter.debits) {
                (true, true) | (false, false) => credit_hit || debit_hit,
                (true, false) => credit_hit,
                (false, true) => debit_hit,
            }
        };
        let mut matches: Vec<Transfer> = state
            .log
            .iter()
            .filter_map(|id| state.transfers.get(id).copied())
            .filter(side_matches)
            .filter(|t| filter.user_data_128.map_or(true, |v| t.user_data_128 == v))
            .filter(|t| filter.code.map_or(true, |v| t.code == v))
            .collect();
        if filter.reversed {
            matches.reverse();
        }
        if filter.limit > 0 {
            matches.truncate(filter.limit);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountFlags, TransferFlags};

    fn capped_account(id: u128, ledger: u32) -> Account {
        Account {
            id,
            ledger,
            code: 1,
            flags: AccountFlags {
                history: true,
                debits_must_not_exceed_credits: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn system_account(ledger: u32) -> Account {
        Account {
            id: ledger as u128,
            ledger,
            code: 2,
            flags: AccountFlags { history: true, ..Default::default() },
            ..Default::default()
        }
    }

    async fn seed(ledger: &InMemoryLedger, wallet: u128, funding: u128) {
        let res = ledger
            .create_accounts(vec![system_account(1), capped_account(wallet, 1)])
            .await
            .unwrap();
        // Re-seeding tolerates the already-bootstrapped system account.
        assert!(res.iter().all(|r| r.code.is_exists()));
        if funding > 0 {
            let res = ledger
                .create_transfers(vec![Transfer {
                    id: 900 + wallet,
                    debit_account_id: 1,
                    credit_account_id: wallet,
                    amount: funding,
                    ledger: 1,
                    code: 3,
                    ..Default::default()
                }])
                .await
                .unwrap();
            assert!(res.is_empty());
        }
    }

    #[tokio::test]
    async fn posting_moves_posted_balances() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 500).await;

        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.credits_posted, 500);
        assert_eq!(account.debits_posted, 0);

        let system = ledger.lookup_accounts(vec![1]).await.unwrap()[0];
        assert_eq!(system.debits_posted, 500);
    }

    #[tokio::test]
    async fn capped_account_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        let res = ledger
            .create_transfers(vec![Transfer {
                id: 2,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 101,
                ledger: 1,
                code: 2,
                ..Default::default()
            }])
            .await
            .unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].code, CreateTransferCode::ExceedsCredits);

        // Nothing was applied.
        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_posted, 0);
    }

    #[tokio::test]
    async fn pending_holds_block_capacity_until_resolved() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        let res = ledger
            .create_transfers(vec![Transfer {
                id: 2,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 60,
                ledger: 1,
                code: 1,
                flags: TransferFlags { pending: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();
        assert!(res.is_empty());

        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_pending, 60);

        // The hold reserves capacity: only 40 is spendable.
        let res = ledger
            .create_transfers(vec![Transfer {
                id: 3,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 50,
                ledger: 1,
                code: 2,
                ..Default::default()
            }])
            .await
            .unwrap();
        assert_eq!(res[0].code, CreateTransferCode::ExceedsCredits);

        // Void releases it.
        let res = ledger
            .create_transfers(vec![Transfer {
                id: 4,
                pending_id: 2,
                flags: TransferFlags { void_pending_transfer: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();
        assert!(res.is_empty());

        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_pending, 0);
        assert_eq!(account.debits_posted, 0);
    }

    #[tokio::test]
    async fn post_after_void_reports_not_pending() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        ledger
            .create_transfers(vec![Transfer {
                id: 2,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 10,
                ledger: 1,
                code: 1,
                flags: TransferFlags { pending: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();

        let void = Transfer {
            id: 3,
            pending_id: 2,
            flags: TransferFlags { void_pending_transfer: true, ..Default::default() },
            ..Default::default()
        };
        assert!(ledger.create_transfers(vec![void]).await.unwrap().is_empty());

        let post = Transfer {
            id: 4,
            pending_id: 2,
            flags: TransferFlags { post_pending_transfer: true, ..Default::default() },
            ..Default::default()
        };
        let res = ledger.create_transfers(vec![post]).await.unwrap();
        assert_eq!(res[0].code, CreateTransferCode::PendingTransferNotPending);
        assert!(res[0].code.is_benign_replay());
    }

    #[tokio::test]
    async fn linked_chain_is_atomic() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;
        seed(&ledger, 11, 0).await;

        // Second leg overdraws wallet 11, so the first leg must not commit.
        let res = ledger
            .create_transfers(vec![
                Transfer {
                    id: 5,
                    debit_account_id: 10,
                    credit_account_id: 1,
                    amount: 10,
                    ledger: 1,
                    code: 1,
                    flags: TransferFlags { linked: true, pending: true, ..Default::default() },
                    ..Default::default()
                },
                Transfer {
                    id: 6,
                    debit_account_id: 11,
                    credit_account_id: 1,
                    amount: 10,
                    ledger: 1,
                    code: 1,
                    flags: TransferFlags { pending: true, ..Default::default() },
                    ..Default::default()
                },
            ])
            .await
            .unwrap();

        assert_eq!(res.len(), 2);
        assert_eq!(res[0].code, CreateTransferCode::LinkedEventFailed);
        assert_eq!(res[1].code, CreateTransferCode::ExceedsCredits);

        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_pending, 0);
        assert!(ledger.lookup_transfers(vec![5, 6]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_linked_chain_is_rejected() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        let res = ledger
            .create_transfers(vec![Transfer {
                id: 7,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 1,
                ledger: 1,
                code: 1,
                flags: TransferFlags { linked: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();
        assert_eq!(res[0].code, CreateTransferCode::LinkedEventChainOpen);
    }

    #[tokio::test]
    async fn transfer_ids_are_idempotence_keys() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        let transfer = Transfer {
            id: 8,
            debit_account_id: 10,
            credit_account_id: 1,
            amount: 5,
            ledger: 1,
            code: 2,
            ..Default::default()
        };
        assert!(ledger.create_transfers(vec![transfer]).await.unwrap().is_empty());
        let res = ledger.create_transfers(vec![transfer]).await.unwrap();
        assert_eq!(res[0].code, CreateTransferCode::Exists);
        assert!(res[0].code.is_benign_replay());

        // The double submission had no further effect.
        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_posted, 5);
    }

    #[tokio::test]
    async fn account_creation_is_idempotent_on_shape() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.create_accounts(vec![system_account(1)]).await.unwrap().is_empty());

        let res = ledger.create_accounts(vec![system_account(1)]).await.unwrap();
        assert_eq!(res[0].code, CreateAccountCode::Exists);
        assert!(res[0].code.is_exists());

        let mut different = system_account(1);
        different.code = 9;
        let res = ledger.create_accounts(vec![different]).await.unwrap();
        assert_eq!(res[0].code, CreateAccountCode::ExistsWithDifferentCode);
    }

    #[tokio::test]
    async fn query_filters_by_tag_and_code() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        for (id, code, tag) in [(21u128, 3u16, 77u128), (22, 2, 77), (23, 3, 88)] {
            ledger
                .create_transfers(vec![Transfer {
                    id,
                    debit_account_id: 1,
                    credit_account_id: 10,
                    amount: 1,
                    ledger: 1,
                    code,
                    user_data_128: tag,
                    ..Default::default()
                }])
                .await
                .unwrap();
        }

        let found = ledger
            .query_transfers(QueryFilter {
                user_data_128: Some(77),
                code: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 21);

        let newest_first = ledger
            .query_transfers(QueryFilter { reversed: true, limit: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(newest_first[0].id, 23);
        assert_eq!(newest_first.len(), 2);
    }

    #[tokio::test]
    async fn account_transfers_credit_side_filter() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        // 10 sends 30 back to the system account.
        ledger
            .create_transfers(vec![Transfer {
                id: 31,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 30,
                ledger: 1,
                code: 2,
                ..Default::default()
            }])
            .await
            .unwrap();

        let credits = ledger
            .account_transfers(AccountFilter {
                account_id: Some(10),
                credits: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].credit_account_id, 10);

        let both = ledger
            .account_transfers(AccountFilter { account_id: Some(10), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn resolution_inherits_pending_legs() {
        let ledger = InMemoryLedger::new();
        seed(&ledger, 10, 100).await;

        ledger
            .create_transfers(vec![Transfer {
                id: 40,
                debit_account_id: 10,
                credit_account_id: 1,
                amount: 25,
                ledger: 1,
                code: 1,
                user_data_64: 9000,
                flags: TransferFlags { pending: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();

        // Post with zero amount and no accounts: everything comes from the
        // pending transfer.
        let res = ledger
            .create_transfers(vec![Transfer {
                id: 41,
                pending_id: 40,
                user_data_64: 9001,
                flags: TransferFlags { post_pending_transfer: true, ..Default::default() },
                ..Default::default()
            }])
            .await
            .unwrap();
        assert!(res.is_empty());

        let stored = ledger.lookup_transfers(vec![41]).await.unwrap()[0];
        assert_eq!(stored.amount, 25);
        assert_eq!(stored.debit_account_id, 10);
        assert_eq!(stored.credit_account_id, 1);
        assert_eq!(stored.ledger, 1);

        let account = ledger.lookup_accounts(vec![10]).await.unwrap()[0];
        assert_eq!(account.debits_posted, 25);
        assert_eq!(account.debits_pending, 0);
    }
}
