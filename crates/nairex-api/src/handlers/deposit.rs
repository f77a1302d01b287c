//! Deposit endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use nairex_services::views::DepositView;
use nairex_services::Scope;
use nairex_types::{ApiResponse, Currency};

use crate::dto::DepositRequest;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;

/// `POST /api/v1/users/{user_id}/deposits/{currency}` (admin/test path)
pub async fn create_deposit(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, currency)): Path<(String, String)>,
    ApiJson(req): ApiJson<DepositRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DepositView>>)> {
    let currency: Currency = currency.parse()?;
    let deposit = state
        .deposits
        .create(&caller, &user_id, currency, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(deposit))))
}

/// `GET /api/v1/users/{user_id}/deposits`
pub async fn list_deposits(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<DepositView>>>> {
    let deposits = state.deposits.list(Scope::AsUser(&caller), &user_id, None).await?;
    Ok(Json(ApiResponse::new(deposits)))
}

/// `GET /api/v1/users/{user_id}/deposits/currency/{currency}`
pub async fn list_deposits_by_currency(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, currency)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Vec<DepositView>>>> {
    let currency: Currency = currency.parse()?;
    let deposits = state
        .deposits
        .list(Scope::AsUser(&caller), &user_id, Some(currency))
        .await?;
    Ok(Json(ApiResponse::new(deposits)))
}

/// `GET /api/v1/users/{user_id}/deposits/{transaction_id}`
pub async fn fetch_deposit(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, transaction_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<DepositView>>> {
    let deposit = state
        .deposits
        .fetch(Scope::AsUser(&caller), &user_id, &transaction_id)
        .await?;
    Ok(Json(ApiResponse::new(deposit)))
}
