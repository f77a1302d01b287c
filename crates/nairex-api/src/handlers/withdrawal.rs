//! Withdrawal endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use nairex_db::WithdrawalKey;
use nairex_services::views::WithdrawalView;
use nairex_services::withdrawal::CreateWithdrawal;
use nairex_services::Scope;
use nairex_types::{ApiResponse, Currency};

use crate::dto::{CreateWithdrawalRequest, WithdrawalsQuery};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;

/// `POST /api/v1/users/{user_id}/withdraws`
pub async fn create_withdrawal(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<CreateWithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<WithdrawalView>>)> {
    let currency: Currency = req.currency.parse()?;
    let withdrawal = state
        .withdrawals
        .create(
            &caller,
            &user_id,
            CreateWithdrawal {
                fund_uid: req.fund_uid,
                currency,
                amount: req.amount,
                transaction_note: req.transaction_note,
                narration: req.narration,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(withdrawal))))
}

/// `GET /api/v1/users/{user_id}/withdraws`
pub async fn list_withdrawals(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
    Query(query): Query<WithdrawalsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<WithdrawalView>>>> {
    let currency = match query.currency.as_deref() {
        Some(raw) => Some(raw.parse::<Currency>()?),
        None => None,
    };
    let withdrawals = state
        .withdrawals
        .list(Scope::AsUser(&caller), &user_id, currency, query.state.as_deref())
        .await?;
    Ok(Json(ApiResponse::new(withdrawals)))
}

/// `GET /api/v1/users/{user_id}/withdraws/{withdrawal_id}`
pub async fn fetch_withdrawal(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, withdrawal_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<WithdrawalView>>> {
    let withdrawal = state
        .withdrawals
        .fetch(Scope::AsUser(&caller), &user_id, WithdrawalKey::Id(&withdrawal_id))
        .await?;
    Ok(Json(ApiResponse::new(withdrawal)))
}

/// `GET /api/v1/users/{user_id}/withdraws/reference/{reference}`
pub async fn fetch_withdrawal_by_reference(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((user_id, reference)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<WithdrawalView>>> {
    let withdrawal = state
        .withdrawals
        .fetch(Scope::AsUser(&caller), &user_id, WithdrawalKey::Reference(&reference))
        .await?;
    Ok(Json(ApiResponse::new(withdrawal)))
}
