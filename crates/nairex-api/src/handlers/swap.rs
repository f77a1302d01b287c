//! Instant-swap endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use nairex_services::swap::CreateSwap;
use nairex_services::views::{QuotationView, SwapView, TemporaryQuoteView};
use nairex_services::Scope;
use nairex_types::{ApiResponse, Currency};

use crate::dto::SwapQuotationRequest;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;

fn parse_request(req: SwapQuotationRequest) -> ApiResult<CreateSwap> {
    let from_currency: Currency = req.from_currency.parse()?;
    let to_currency: Currency = req.to_currency.parse()?;
    Ok(CreateSwap { from_currency, to_currency, from_amount: req.from_amount })
}

/// `POST /api/v1/users/{user_id}/temporary_swap_quotation`
pub async fn temporary_quotation(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<SwapQuotationRequest>,
) -> ApiResult<Json<ApiResponse<TemporaryQuoteView>>> {
    let quote = state
        .swaps
        .temporary_quote(&caller, &user_id, parse_request(req)?)
        .await?;
    Ok(Json(ApiResponse::new(quote)))
}

/// `POST /api/v1/users/{user_id}/swap_quotation`
pub async fn create_quotation(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<SwapQuotationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<QuotationView>>)> {
    let quotation = state
        .swaps
        .create_quote(&caller, &user_id, parse_request(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(quotation))))
}

/// `POST /api/v1/users/{user_id}/swap_quotation/{quotation_id}/confirm`
///
/// Returns a `pending` view immediately; the posting happens off the
/// request path.
pub async fn confirm_quotation(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, quotation_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<SwapView>>> {
    let swap = state.swaps.confirm(&caller, &user_id, &quotation_id).await?;
    Ok(Json(ApiResponse::new(swap)))
}

/// `GET /api/v1/users/{user_id}/swap_transactions`
pub async fn list_swaps(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<SwapView>>>> {
    let swaps = state.swaps.list_swaps(Scope::AsUser(&caller), &user_id).await?;
    Ok(Json(ApiResponse::new(swaps)))
}

/// `GET /api/v1/users/{user_id}/swap_transactions/{swap_transaction_id}`
pub async fn fetch_swap(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, swap_transaction_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<SwapView>>> {
    let swap = state
        .swaps
        .fetch_swap(Scope::AsUser(&caller), &user_id, &swap_transaction_id)
        .await?;
    Ok(Json(ApiResponse::new(swap)))
}
