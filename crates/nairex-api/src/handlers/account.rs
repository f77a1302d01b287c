//! Account endpoints: signup, webhook settings, sub-account management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use nairex_db::DbAccessToken;
use nairex_services::account::{CreateAccount, CreateSubAccount, EditSubAccount};
use nairex_services::views::UserView;
use nairex_services::Scope;
use nairex_types::ApiResponse;

use crate::dto::{
    CreateAccountRequest, CreateSubAccountRequest, EditSubAccountRequest, UpdateWebhookRequest,
};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateAccountData {
    pub user: UserView,
    pub token: DbAccessToken,
}

/// `POST /api/v1/accounts` (public)
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreateAccountData>>)> {
    let (user, token) = state
        .accounts
        .create_account(CreateAccount {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            display_name: req.display_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            CreateAccountData { user, token },
            "Account Created successfully",
        )),
    ))
}

/// `PUT /api/v1/accounts`
pub async fn update_webhook(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(req): ApiJson<UpdateWebhookRequest>,
) -> ApiResult<StatusCode> {
    state
        .accounts
        .update_webhook(&caller, req.callback_url, req.webhook_key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/users`
pub async fn create_sub_account(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(req): ApiJson<CreateSubAccountRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserView>>)> {
    let user = state
        .accounts
        .create_sub_account(
            &caller,
            CreateSubAccount {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

/// `GET /api/v1/users`
pub async fn list_sub_accounts(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<UserView>>>> {
    let users = state.accounts.fetch_sub_accounts(&caller).await?;
    Ok(Json(ApiResponse::new(users)))
}

/// `GET /api/v1/users/{user_id}` (accepts the `me` sentinel)
pub async fn fetch_account(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<UserView>>> {
    let user = state
        .accounts
        .fetch_account_view(Scope::AsUser(&caller), &user_id)
        .await?;
    Ok(Json(ApiResponse::new(user)))
}

/// `PUT /api/v1/users/{user_id}`
pub async fn edit_sub_account(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<EditSubAccountRequest>,
) -> ApiResult<Json<ApiResponse<UserView>>> {
    let user = state
        .accounts
        .edit_sub_account(
            &caller,
            &user_id,
            EditSubAccount {
                first_name: req.first_name,
                last_name: req.last_name,
                phone_number: req.phone_number,
            },
        )
        .await?;
    Ok(Json(ApiResponse::new(user)))
}
