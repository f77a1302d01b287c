//! End-to-end orchestration tests over the in-process ledger engine and an
//! in-memory metadata store: the swap protocol's money movements, the
//! confirm/reversal race, and withdrawal/deposit flows.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use nairex_db::Database;
use nairex_ledger::{InMemoryLedger, LedgerClient};
use nairex_services::account::CreateAccount;
use nairex_services::swap::CreateSwap;
use nairex_services::withdrawal::CreateWithdrawal;
use nairex_services::{
    AccountService, AuthedAccount, DepositService, Scheduler, Scope, SwapService, WalletService,
    WebhookDispatcher, WithdrawalService,
};
use nairex_types::{Currency, ErrorKind, RateTable};

struct Harness {
    accounts: AccountService,
    wallets: WalletService,
    swaps: SwapService,
    withdrawals: WithdrawalService,
    deposits: DepositService,
}

async fn harness(pending_ttl: Duration) -> Harness {
    let db = Database::in_memory().await.expect("in-memory store");
    let ledger: Arc<dyn LedgerClient> = Arc::new(InMemoryLedger::new());
    let accounts = AccountService::new(db.clone(), Arc::clone(&ledger));
    let wallets = WalletService::new(db.clone(), Arc::clone(&ledger), accounts.clone());
    wallets.init_system_accounts().await.expect("bootstrap");

    let scheduler = Scheduler::new();
    let webhooks = WebhookDispatcher::new(Duration::ZERO, Duration::ZERO);
    let swaps = SwapService::new(
        db.clone(),
        Arc::clone(&ledger),
        accounts.clone(),
        wallets.clone(),
        scheduler,
        webhooks.clone(),
        Arc::new(RateTable::default()),
        pending_ttl,
    );
    let withdrawals = WithdrawalService::new(
        db.clone(),
        Arc::clone(&ledger),
        accounts.clone(),
        wallets.clone(),
        webhooks.clone(),
    );
    let deposits =
        DepositService::new(db, ledger, accounts.clone(), wallets.clone(), webhooks);

    Harness { accounts, wallets, swaps, withdrawals, deposits }
}

async fn signup(h: &Harness, email: &str) -> AuthedAccount {
    let (_, token) = h
        .accounts
        .create_account(CreateAccount {
            email: email.to_string(),
            password: "correct horse battery staple".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            display_name: "Ada".to_string(),
        })
        .await
        .expect("signup");
    h.accounts.resolve_token(&token.token).await.expect("resolve")
}

async fn fund(h: &Harness, caller: &AuthedAccount, currency: Currency, amount: &str) {
    h.deposits
        .create(caller, "me", currency, dec(amount))
        .await
        .expect("funding deposit");
}

async fn balances(h: &Harness, caller: &AuthedAccount, currency: Currency) -> (Decimal, Decimal) {
    let view = h
        .wallets
        .fetch_wallet(Scope::AsUser(caller), "me", currency)
        .await
        .expect("wallet fetch");
    (view.balance, view.locked_balance)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn swap_request(from: Currency, to: Currency, amount: &str) -> CreateSwap {
    CreateSwap { from_currency: from, to_currency: to, from_amount: dec(amount) }
}

/// Poll the swap listing until a swap with `status` appears.
async fn wait_for_status(h: &Harness, caller: &AuthedAccount, status: &str) -> bool {
    for _ in 0..100 {
        let listed = h
            .swaps
            .list_swaps(Scope::AsUser(caller), "me")
            .await
            .expect("list swaps");
        if listed.iter().any(|s| s.status == status) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test]
async fn quote_places_holds_and_reversal_releases_them() {
    let h = harness(Duration::from_millis(300)).await;
    let caller = signup(&h, "reversal@example.com").await;
    fund(&h, &caller, Currency::Usdt, "100").await;

    let quote = h
        .swaps
        .create_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect("quote");
    assert!(!quote.confirmed);
    assert_eq!(quote.from_amount, dec("10.00"));
    assert_eq!(quote.to_amount, dec("15000.00"));
    assert_eq!(quote.quoted_price, dec("1500.00"));
    assert_eq!(quote.quoted_currency, "ngn");

    // The hold is visible immediately.
    let (available, locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(available, dec("90.00"));
    assert_eq!(locked, dec("10.00"));

    // Never confirmed: the reversal fires at the deadline and releases the
    // hold with no net change.
    assert!(wait_for_status(&h, &caller, "reversed").await, "reversal never classified");
    let (available, locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(available, dec("100.00"));
    assert_eq!(locked, dec("0.00"));
    let (ngn_available, _) = balances(&h, &caller, Currency::Ngn).await;
    assert_eq!(ngn_available, dec("0.00"));
}

#[tokio::test]
async fn confirm_within_deadline_moves_both_balances() {
    let h = harness(Duration::from_secs(12)).await;
    let caller = signup(&h, "confirm@example.com").await;
    fund(&h, &caller, Currency::Usdt, "100").await;

    let quote = h
        .swaps
        .create_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect("quote");

    let pending = h.swaps.confirm(&caller, "me", &quote.id).await.expect("confirm");
    assert_eq!(pending.status, "pending");
    assert_eq!(pending.swap_quotation.id, quote.id);

    assert!(wait_for_status(&h, &caller, "confirmed").await, "confirmation never landed");

    let (usdt_available, usdt_locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(usdt_available, dec("90.00"));
    assert_eq!(usdt_locked, dec("0.00"));
    let (ngn_available, _) = balances(&h, &caller, Currency::Ngn).await;
    assert_eq!(ngn_available, dec("15000.00"));

    let fetched = h
        .swaps
        .fetch_swap(Scope::AsUser(&caller), "me", &{
            let listed = h.swaps.list_swaps(Scope::AsUser(&caller), "me").await.unwrap();
            listed[0].id.clone()
        })
        .await
        .expect("fetch swap");
    assert_eq!(fetched.status, "confirmed");
    assert!(fetched.swap_quotation.confirmed);
}

#[tokio::test]
async fn insufficient_balance_rejects_and_persists_nothing() {
    let h = harness(Duration::from_secs(12)).await;
    let caller = signup(&h, "broke@example.com").await;
    fund(&h, &caller, Currency::Usdt, "5").await;

    let err = h
        .swaps
        .create_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect_err("must reject");
    assert_eq!(err.kind, ErrorKind::FailedDependency);
    assert_eq!(err.message, "Insufficient Balance");

    // No hold, no swap row, nothing to list.
    let (available, locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(available, dec("5.00"));
    assert_eq!(locked, dec("0.00"));
    let listed = h.swaps.list_swaps(Scope::AsUser(&caller), "me").await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn confirm_after_reversal_is_benign() {
    let h = harness(Duration::from_millis(200)).await;
    let caller = signup(&h, "late@example.com").await;
    fund(&h, &caller, Currency::Usdt, "100").await;

    let quote = h
        .swaps
        .create_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect("quote");

    // Let the reversal win the race outright.
    assert!(wait_for_status(&h, &caller, "reversed").await);

    // A late confirm still answers, but its posting loses against the void
    // and must not move any money or flip the status.
    let pending = h.swaps.confirm(&caller, "me", &quote.id).await.expect("late confirm");
    assert_eq!(pending.status, "pending");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (available, locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(available, dec("100.00"));
    assert_eq!(locked, dec("0.00"));
    let (ngn_available, _) = balances(&h, &caller, Currency::Ngn).await;
    assert_eq!(ngn_available, dec("0.00"));
    let listed = h.swaps.list_swaps(Scope::AsUser(&caller), "me").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "reversed");
}

#[tokio::test]
async fn reversal_after_confirm_is_benign() {
    let h = harness(Duration::from_secs(12)).await;
    let caller = signup(&h, "race@example.com").await;
    fund(&h, &caller, Currency::Usdt, "100").await;

    let quote = h
        .swaps
        .create_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect("quote");
    h.swaps.confirm(&caller, "me", &quote.id).await.expect("confirm");
    assert!(wait_for_status(&h, &caller, "confirmed").await);

    // Drive the reversal by hand, as if cancellation had lost the race.
    // The void targets ids the post already resolved: benign.
    h.swaps.run_reversal(&quote.id).await;

    let (usdt_available, usdt_locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(usdt_available, dec("90.00"));
    assert_eq!(usdt_locked, dec("0.00"));
    let (ngn_available, _) = balances(&h, &caller, Currency::Ngn).await;
    assert_eq!(ngn_available, dec("15000.00"));
    let listed = h.swaps.list_swaps(Scope::AsUser(&caller), "me").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "confirmed");
}

#[tokio::test]
async fn temporary_quote_has_no_ledger_effect() {
    let h = harness(Duration::from_secs(12)).await;
    let caller = signup(&h, "temp@example.com").await;
    fund(&h, &caller, Currency::Usdt, "100").await;

    let quote = h
        .swaps
        .temporary_quote(&caller, "me", swap_request(Currency::Usdt, Currency::Ngn, "10"))
        .await
        .expect("temporary quote");
    assert_eq!(quote.to_amount, dec("15000.00"));

    let (available, locked) = balances(&h, &caller, Currency::Usdt).await;
    assert_eq!(available, dec("100.00"));
    assert_eq!(locked, dec("0.00"));
}

#[tokio::test]
async fn withdrawal_moves_funds_and_strips_unrelated_viewers() {
    let h = harness(Duration::from_secs(12)).await;
    let sender = signup(&h, "sender@example.com").await;
    let recipient = signup(&h, "recipient@example.com").await;
    let outsider = signup(&h, "outsider@example.com").await;
    fund(&h, &sender, Currency::Btc, "2").await;

    let view = h
        .withdrawals
        .create(
            &sender,
            "me",
            CreateWithdrawal {
                fund_uid: recipient.account.id.clone(),
                currency: Currency::Btc,
                amount: dec("1"),
                transaction_note: "rent".to_string(),
                narration: "march".to_string(),
            },
        )
        .await
        .expect("withdrawal");
    assert_eq!(view.status, "completed");
    assert_eq!(view.amount, dec("1.00000000"));
    assert_eq!(view.reference, view.transaction_id);

    let (sender_available, _) = balances(&h, &sender, Currency::Btc).await;
    assert_eq!(sender_available, dec("1.00000000"));
    let (recipient_available, _) = balances(&h, &recipient, Currency::Btc).await;
    assert_eq!(recipient_available, dec("1.00000000"));

    // The sender sees everything.
    let fetched = h
        .withdrawals
        .fetch(
            Scope::AsUser(&sender),
            "me",
            nairex_db::WithdrawalKey::Reference(&view.reference),
        )
        .await
        .expect("sender fetch");
    assert!(fetched.wallet.is_some());
    assert!(fetched.user.email.is_some());

    // The recipient (a different parent) gets the stripped counterparty.
    let fetched = h
        .withdrawals
        .fetch(
            Scope::AsUser(&recipient),
            "me",
            nairex_db::WithdrawalKey::Reference(&view.reference),
        )
        .await
        .expect("recipient fetch");
    assert!(fetched.wallet.is_none());
    assert!(fetched.user.email.is_none());
    assert_eq!(fetched.user.id, sender.account.id);

    // An unrelated account cannot see it at all.
    let err = h
        .withdrawals
        .fetch(
            Scope::AsUser(&outsider),
            "me",
            nairex_db::WithdrawalKey::Reference(&view.reference),
        )
        .await
        .expect_err("hidden from outsiders");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn overdrawn_withdrawal_is_rejected_and_rolled_back() {
    let h = harness(Duration::from_secs(12)).await;
    let sender = signup(&h, "poor-sender@example.com").await;
    let recipient = signup(&h, "rich-recipient@example.com").await;
    fund(&h, &sender, Currency::Eth, "0.5").await;

    let err = h
        .withdrawals
        .create(
            &sender,
            "me",
            CreateWithdrawal {
                fund_uid: recipient.account.id.clone(),
                currency: Currency::Eth,
                amount: dec("1"),
                transaction_note: String::new(),
                narration: String::new(),
            },
        )
        .await
        .expect_err("must reject");
    assert_eq!(err.kind, ErrorKind::FailedDependency);
    assert_eq!(err.message, "Insufficient Balance");

    // The metadata row rolled back with the ledger refusal.
    let listed = h
        .withdrawals
        .list(Scope::AsUser(&sender), "me", None, None)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn deposits_list_and_filter_by_currency() {
    let h = harness(Duration::from_secs(12)).await;
    let caller = signup(&h, "deposits@example.com").await;

    fund(&h, &caller, Currency::Ngn, "100").await;
    fund(&h, &caller, Currency::Usdt, "40").await;

    let all = h
        .deposits
        .list(Scope::AsUser(&caller), "me", None)
        .await
        .expect("list all");
    assert_eq!(all.len(), 2);

    let ngn_only = h
        .deposits
        .list(Scope::AsUser(&caller), "me", Some(Currency::Ngn))
        .await
        .expect("list ngn");
    assert_eq!(ngn_only.len(), 1);
    assert_eq!(ngn_only[0].currency, "ngn");
    assert_eq!(ngn_only[0].amount, dec("100.00"));

    let fetched = h
        .deposits
        .fetch(Scope::AsUser(&caller), "me", &ngn_only[0].tx_id)
        .await
        .expect("fetch one");
    assert_eq!(fetched.amount, dec("100.00"));
    assert_eq!(fetched.status, "completed");

    // Another user cannot read it.
    let other = signup(&h, "other-deposits@example.com").await;
    let err = h
        .deposits
        .fetch(Scope::AsUser(&other), "me", &ngn_only[0].tx_id)
        .await
        .expect_err("scoped");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn sub_account_swaps_on_behalf_of_parent() {
    let h = harness(Duration::from_secs(12)).await;
    let parent = signup(&h, "family@example.com").await;
    let sub = h
        .accounts
        .create_sub_account(
            &parent,
            nairex_services::account::CreateSubAccount {
                email: "family-sub@example.com".to_string(),
                first_name: "Sub".to_string(),
                last_name: "Account".to_string(),
            },
        )
        .await
        .expect("sub-account");

    fund(&h, &parent, Currency::Usdt, "50").await;
    // Parent funds the sub-account via withdrawal.
    h.withdrawals
        .create(
            &parent,
            "me",
            CreateWithdrawal {
                fund_uid: sub.id.clone(),
                currency: Currency::Usdt,
                amount: dec("20"),
                transaction_note: String::new(),
                narration: String::new(),
            },
        )
        .await
        .expect("fund sub");

    // The parent quotes and confirms on the sub-account's wallets.
    let quote = h
        .swaps
        .create_quote(&parent, &sub.id, swap_request(Currency::Usdt, Currency::Ngn, "5"))
        .await
        .expect("quote for sub");
    h.swaps.confirm(&parent, &sub.id, &quote.id).await.expect("confirm for sub");

    for _ in 0..100 {
        let listed = h
            .swaps
            .list_swaps(Scope::AsUser(&parent), &sub.id)
            .await
            .expect("list sub swaps");
        if listed.iter().any(|s| s.status == "confirmed") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let sub_row = h.accounts.fetch_account(Scope::Internal, &sub.id).await.unwrap();
    let ngn = h
        .wallets
        .wallet_for_account(&sub_row, Currency::Ngn)
        .await
        .expect("sub ngn wallet");
    assert_eq!(ngn.balance, dec("7500.00"));
}
