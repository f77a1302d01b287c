//! Wallet endpoints.

use axum::extract::{Path, State};
use axum::Json;

use nairex_services::views::WalletView;
use nairex_services::Scope;
use nairex_types::{ApiResponse, Currency};

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// `GET /api/v1/users/{user_id}/wallets`
pub async fn list_wallets(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<WalletView>>>> {
    let wallets = state.wallets.fetch_wallets(Scope::AsUser(&caller), &user_id).await?;
    Ok(Json(ApiResponse::new(wallets)))
}

/// `GET /api/v1/users/{user_id}/wallets/{currency}`
pub async fn fetch_wallet(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, currency)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<WalletView>>> {
    let currency: Currency = currency.parse()?;
    let wallet = state
        .wallets
        .fetch_wallet(Scope::AsUser(&caller), &user_id, currency)
        .await?;
    Ok(Json(ApiResponse::new(wallet)))
}

/// `GET /api/v1/users/{user_id}/wallets/{currency}/address`
///
/// Placeholder payload: on-chain deposits are not supported, the shape is
/// kept for client compatibility.
pub async fn payment_address(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, currency)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let currency: Currency = currency.parse()?;
    let wallet = state
        .wallets
        .fetch_wallet(Scope::AsUser(&caller), &user_id, currency)
        .await?;
    Ok(Json(ApiResponse::new(stub_address(&wallet))))
}

/// `GET /api/v1/users/{user_id}/wallets/{currency}/addresses`
pub async fn payment_addresses(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, currency)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Vec<serde_json::Value>>>> {
    let currency: Currency = currency.parse()?;
    let wallet = state
        .wallets
        .fetch_wallet(Scope::AsUser(&caller), &user_id, currency)
        .await?;
    Ok(Json(ApiResponse::new(vec![stub_address(&wallet)])))
}

fn stub_address(wallet: &WalletView) -> serde_json::Value {
    serde_json::json!({
        "id": wallet.id,
        "reference": wallet.id,
        "currency": wallet.currency,
        "address": "",
        "destination_tag": "deposit_not_supported",
        "total_payments": "0",
        "network": "",
    })
}
