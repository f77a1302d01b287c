//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route(
            "/api/v1/accounts",
            post(handlers::account::create_account).put(handlers::account::update_webhook),
        )
        .route(
            "/api/v1/users",
            post(handlers::account::create_sub_account).get(handlers::account::list_sub_accounts),
        )
        .route(
            "/api/v1/users/{user_id}",
            get(handlers::account::fetch_account).put(handlers::account::edit_sub_account),
        )
        // Wallets
        .route("/api/v1/users/{user_id}/wallets", get(handlers::wallet::list_wallets))
        .route(
            "/api/v1/users/{user_id}/wallets/{currency}",
            get(handlers::wallet::fetch_wallet),
        )
        .route(
            "/api/v1/users/{user_id}/wallets/{currency}/address",
            get(handlers::wallet::payment_address),
        )
        .route(
            "/api/v1/users/{user_id}/wallets/{currency}/addresses",
            get(handlers::wallet::payment_addresses),
        )
        // Swaps
        .route(
            "/api/v1/users/{user_id}/temporary_swap_quotation",
            post(handlers::swap::temporary_quotation),
        )
        .route(
            "/api/v1/users/{user_id}/swap_quotation",
            post(handlers::swap::create_quotation),
        )
        .route(
            "/api/v1/users/{user_id}/swap_quotation/{quotation_id}/confirm",
            post(handlers::swap::confirm_quotation),
        )
        .route(
            "/api/v1/users/{user_id}/swap_transactions",
            get(handlers::swap::list_swaps),
        )
        .route(
            "/api/v1/users/{user_id}/swap_transactions/{swap_transaction_id}",
            get(handlers::swap::fetch_swap),
        )
        // Markets
        .route("/api/v1/markets/tickers/{market}", get(handlers::market::ticker))
        // Withdrawals
        .route(
            "/api/v1/users/{user_id}/withdraws",
            post(handlers::withdrawal::create_withdrawal)
                .get(handlers::withdrawal::list_withdrawals),
        )
        .route(
            "/api/v1/users/{user_id}/withdraws/reference/{reference}",
            get(handlers::withdrawal::fetch_withdrawal_by_reference),
        )
        .route(
            "/api/v1/users/{user_id}/withdraws/{withdrawal_id}",
            get(handlers::withdrawal::fetch_withdrawal),
        )
        // Deposits. Creation addresses a currency, reads address a
        // transfer id; they share the one parameterized slot.
        .route(
            "/api/v1/users/{user_id}/deposits",
            get(handlers::deposit::list_deposits),
        )
        .route(
            "/api/v1/users/{user_id}/deposits/currency/{currency}",
            get(handlers::deposit::list_deposits_by_currency),
        )
        .route(
            "/api/v1/users/{user_id}/deposits/{deposit_id}",
            post(handlers::deposit::create_deposit).get(handlers::deposit::fetch_deposit),
        )
}
